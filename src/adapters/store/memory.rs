//! In-memory key-value store
//!
//! Tables keep items in insertion order, so scans are deterministic. Used by
//! tests, dry runs and the `memory` store backend.

use super::traits::{item_key, project, CounterStore, KeyValueStore, ScanPage, MAX_BATCH_WRITE_ITEMS};
use crate::domain::{AttributeValue, Item, Result, StoreError, ID_ATTRIBUTE};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// One table: items in insertion order plus a key index
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    items: Vec<Item>,
    index: HashMap<String, usize>,
}

impl Table {
    pub(crate) fn from_items(items: Vec<Item>) -> std::result::Result<Self, StoreError> {
        let mut table = Table::default();
        for item in items {
            table.upsert(item)?;
        }
        Ok(table)
    }

    pub(crate) fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn upsert(&mut self, item: Item) -> std::result::Result<(), StoreError> {
        let key = item_key(&item)
            .ok_or_else(|| StoreError::InvalidItem(format!("item has no {ID_ATTRIBUTE}")))?
            .to_string();

        match self.index.get(&key) {
            Some(&position) => self.items[position] = item,
            None => {
                self.index.insert(key, self.items.len());
                self.items.push(item);
            }
        }
        Ok(())
    }

    pub(crate) fn page(
        &self,
        projection: Option<&[&str]>,
        start_key: Option<&Item>,
        limit: usize,
    ) -> std::result::Result<ScanPage, StoreError> {
        let start = match start_key {
            None => 0,
            Some(key_item) => {
                let key = item_key(key_item).ok_or_else(|| {
                    StoreError::InvalidContinuation(format!("key has no {ID_ATTRIBUTE}"))
                })?;
                self.index
                    .get(key)
                    .map(|position| position + 1)
                    .ok_or_else(|| StoreError::InvalidContinuation(key.to_string()))?
            }
        };

        let end = (start + limit.max(1)).min(self.items.len());
        let items: Vec<Item> = self.items[start.min(end)..end]
            .iter()
            .map(|item| project(item, projection))
            .collect();

        let last_evaluated_key = if end < self.items.len() {
            self.items[end - 1]
                .get(ID_ATTRIBUTE)
                .map(|key| Item::from([(ID_ATTRIBUTE.to_string(), key.clone())]))
        } else {
            None
        };

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }
}

pub(crate) fn check_batch_size(items: &[Item]) -> std::result::Result<(), StoreError> {
    if items.len() > MAX_BATCH_WRITE_ITEMS {
        return Err(StoreError::BatchTooLarge {
            size: items.len(),
            limit: MAX_BATCH_WRITE_ITEMS,
        });
    }
    Ok(())
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    counters: HashMap<String, u64>,
}

/// Key-value store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryTableStore {
    state: Mutex<State>,
}

impl MemoryTableStore {
    /// Create an empty store with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given tables already present
    pub async fn with_tables(tables: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().await;
            for table in tables {
                state.tables.insert((*table).to_string(), Table::default());
            }
        }
        store
    }

    /// Number of items in a table, 0 if it doesn't exist
    pub async fn item_count(&self, table: &str) -> usize {
        let state = self.state.lock().await;
        state.tables.get(table).map_or(0, Table::len)
    }

    /// Copy of every item in a table, in insertion order
    pub async fn items(&self, table: &str) -> Vec<Item> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .map(|t| t.items().to_vec())
            .unwrap_or_default()
    }

    /// Seed a table with numeric `ID`s, for watermark scenarios
    pub async fn seed_ids(&self, table: &str, ids: &[u64]) -> Result<()> {
        let mut state = self.state.lock().await;
        let target = state.tables.entry(table.to_string()).or_default();
        for id in ids {
            target.upsert(Item::from([(ID_ATTRIBUTE.to_string(), AttributeValue::n(id))]))?;
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryTableStore {
    async fn ensure_table(&self, table: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.tables.entry(table.to_string()).or_default();
        Ok(())
    }

    async fn scan_page(
        &self,
        table: &str,
        projection: Option<&[&str]>,
        start_key: Option<&Item>,
        limit: usize,
    ) -> Result<ScanPage> {
        let state = self.state.lock().await;
        let target = state
            .tables
            .get(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;
        Ok(target.page(projection, start_key, limit)?)
    }

    async fn batch_write(&self, table: &str, items: Vec<Item>) -> Result<Vec<Item>> {
        check_batch_size(&items)?;

        let mut state = self.state.lock().await;
        let target = state
            .tables
            .get_mut(table)
            .ok_or_else(|| StoreError::TableNotFound(table.to_string()))?;

        for item in items {
            target.upsert(item)?;
        }
        Ok(Vec::new())
    }
}

#[async_trait]
impl CounterStore for MemoryTableStore {
    async fn read_counter(&self, name: &str) -> Result<Option<u64>> {
        let state = self.state.lock().await;
        Ok(state.counters.get(name).copied())
    }

    async fn compare_and_swap(&self, name: &str, expected: Option<u64>, new: u64) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.counters.get(name).copied() != expected {
            return Ok(false);
        }
        state.counters.insert(name.to_string(), new);
        Ok(true)
    }
}
