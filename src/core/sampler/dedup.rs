//! Never-seen row selection
//!
//! Rows are compared by their normalized identity, so two rows match when
//! they carry the same columns with the same string values in any order.

use crate::config::DedupPolicy;
use crate::domain::NormalizedRow;
use std::collections::{HashMap, HashSet};

/// Candidate rows for the next sample, in selection order
///
/// With [`DedupPolicy::SymmetricDifference`] the checkpoint rows come first,
/// then the source rows, and only rows occurring exactly once across both
/// survive. A checkpoint row missing from the latest source pull is
/// therefore a candidate, and a row duplicated within the source is not.
///
/// With [`DedupPolicy::SourceOnly`] the candidates are the source rows not
/// present in the checkpoint, repeated rows collapsed to their first
/// occurrence.
pub fn select_candidates(
    source: &[NormalizedRow],
    checkpoint: &[NormalizedRow],
    policy: DedupPolicy,
) -> Vec<NormalizedRow> {
    match policy {
        DedupPolicy::SymmetricDifference => symmetric_difference(source, checkpoint),
        DedupPolicy::SourceOnly => source_only(source, checkpoint),
    }
}

fn symmetric_difference(source: &[NormalizedRow], checkpoint: &[NormalizedRow]) -> Vec<NormalizedRow> {
    let union = || checkpoint.iter().chain(source.iter());

    let mut counts: HashMap<Vec<(String, String)>, usize> = HashMap::new();
    for row in union() {
        *counts.entry(row.identity()).or_default() += 1;
    }

    union()
        .filter(|row| counts.get(&row.identity()) == Some(&1))
        .cloned()
        .collect()
}

fn source_only(source: &[NormalizedRow], checkpoint: &[NormalizedRow]) -> Vec<NormalizedRow> {
    let mut seen: HashSet<Vec<(String, String)>> =
        checkpoint.iter().map(NormalizedRow::identity).collect();

    source
        .iter()
        .filter(|row| seen.insert(row.identity()))
        .cloned()
        .collect()
}
