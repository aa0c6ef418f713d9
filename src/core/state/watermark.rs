//! ID watermarks and runs
//!
//! The watermark of a target table is the largest `ID` it holds. A batch
//! receives a contiguous [`IdRun`] starting just above it.

use crate::domain::{Result, TripstreamError};
use serde::{Deserialize, Serialize};

/// Largest identifier observed in a target table
///
/// # Examples
///
/// ```
/// use tripstream::core::state::IdWatermark;
///
/// let watermark = IdWatermark::new("FhvTable", 10);
/// let run = watermark.next_run(3).unwrap();
/// assert_eq!(run.ids().collect::<Vec<_>>(), vec![11, 12, 13]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdWatermark {
    /// Table the watermark was taken from
    pub table: String,

    /// Largest `ID` present, 0 for an empty table
    pub max_id: u64,
}

impl IdWatermark {
    /// Create a watermark
    pub fn new(table: impl Into<String>, max_id: u64) -> Self {
        Self {
            table: table.into(),
            max_id,
        }
    }

    /// The run of `count` identifiers directly above the watermark
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the run would pass `u64::MAX`.
    pub fn next_run(&self, count: usize) -> Result<IdRun> {
        IdRun::after(self.max_id, count)
    }
}

/// A contiguous, strictly increasing run of identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRun {
    start: u64,
    count: usize,
}

impl IdRun {
    /// Run of `count` identifiers beginning just above `base`
    ///
    /// # Errors
    ///
    /// Returns `Allocation` if the last identifier would not fit in a `u64`.
    pub fn after(base: u64, count: usize) -> Result<Self> {
        if count == 0 {
            return Ok(Self {
                start: base.saturating_add(1),
                count,
            });
        }

        let last = u64::try_from(count)
            .ok()
            .and_then(|count| base.checked_add(count))
            .ok_or_else(|| {
                TripstreamError::Allocation(format!(
                    "cannot allocate {count} ID(s) above {base}: identifier space exhausted"
                ))
            })?;

        Ok(Self {
            start: last - (count as u64 - 1),
            count,
        })
    }

    /// First identifier
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Number of identifiers
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the run is empty
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Last identifier, `None` for an empty run
    pub fn last(&self) -> Option<u64> {
        (self.count > 0).then(|| self.start + (self.count as u64 - 1))
    }

    /// The identifiers in increasing order
    pub fn ids(&self) -> impl Iterator<Item = u64> {
        let start = self.start;
        (0..self.count as u64).map(move |offset| start + offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_bounds() {
        let run = IdRun::after(10, 3).unwrap();
        assert_eq!(run.start(), 11);
        assert_eq!(run.last(), Some(13));
        assert_eq!(run.len(), 3);
    }

    #[test]
    fn test_run_ending_at_max_id() {
        let run = IdRun::after(u64::MAX - 2, 2).unwrap();
        assert_eq!(run.ids().collect::<Vec<_>>(), vec![u64::MAX - 1, u64::MAX]);
        assert_eq!(run.last(), Some(u64::MAX));
    }

    #[test]
    fn test_run_past_max_id_is_allocation_error() {
        let err = IdWatermark::new("T", u64::MAX).next_run(1).unwrap_err();
        assert!(matches!(err, TripstreamError::Allocation(_)));

        let err = IdRun::after(u64::MAX - 1, 2).unwrap_err();
        assert!(matches!(err, TripstreamError::Allocation(_)));
    }

    #[test]
    fn test_empty_run_at_max_id() {
        let run = IdWatermark::new("T", u64::MAX).next_run(0).unwrap();
        assert!(run.is_empty());
    }

    #[test]
    fn test_empty_run() {
        let run = IdWatermark::new("T", 0).next_run(0).unwrap();
        assert!(run.is_empty());
        assert_eq!(run.last(), None);
        assert_eq!(run.ids().count(), 0);
    }

    #[test]
    fn test_run_from_empty_table_starts_at_one() {
        let run = IdWatermark::new("T", 0).next_run(2).unwrap();
        assert_eq!(run.ids().collect::<Vec<_>>(), vec![1, 2]);
    }
}
