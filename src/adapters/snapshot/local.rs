//! JSON-lines snapshot store rooted at a local directory

use super::traits::SnapshotStore;
use crate::domain::{Result, SourceRow, TripstreamError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Objects stored as `<root>/<name>`, one JSON object per line
#[derive(Debug, Clone)]
pub struct LocalSnapshotStore {
    root: PathBuf,
}

impl LocalSnapshotStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of an object
    pub fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// Parses JSON-lines content; blank lines are skipped
pub fn parse_json_lines(name: &str, content: &str) -> Result<Vec<SourceRow>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let value: serde_json::Value = serde_json::from_str(line).map_err(|e| {
                TripstreamError::UpstreamRead(format!("{name} line {}: {e}", index + 1))
            })?;
            SourceRow::from_value(value)
        })
        .collect()
}

/// Renders rows as JSON-lines content
pub fn render_json_lines(rows: &[SourceRow]) -> Result<String> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&serde_json::to_string(row.fields())?);
        out.push('\n');
    }
    Ok(out)
}

#[async_trait]
impl SnapshotStore for LocalSnapshotStore {
    async fn read_rows(&self, name: &str) -> Result<Vec<SourceRow>> {
        let path = self.object_path(name);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            TripstreamError::UpstreamRead(format!(
                "Failed to read {}: {e}",
                path.display()
            ))
        })?;

        let rows = parse_json_lines(name, &content)?;
        tracing::debug!(object = name, rows = rows.len(), "Read snapshot object");
        Ok(rows)
    }

    async fn write_rows(&self, name: &str, rows: &[SourceRow]) -> Result<()> {
        let path = self.object_path(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, render_json_lines(rows)?).await?;

        tracing::debug!(object = name, rows = rows.len(), "Wrote snapshot object");
        Ok(())
    }
}
