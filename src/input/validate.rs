use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::warn;

use crate::input::InputError;
use crate::model::records::{Candidate, Rater, ScoreRecord};

/// Every rater_id and candidate_id appearing in score records must exist in
/// its roster. Violations abort the run before any output is produced.
pub fn check_rosters(
    records: &[ScoreRecord],
    raters: &[Rater],
    candidates: &[Candidate],
) -> Result<(), InputError> {
    let known_raters: HashSet<&str> = raters.iter().map(|r| r.rater_id.as_str()).collect();
    let known_candidates: HashSet<u32> = candidates.iter().map(|c| c.candidate_id).collect();

    let missing_raters: BTreeSet<&str> = records
        .iter()
        .map(|r| r.rater_id.as_str())
        .filter(|id| !known_raters.contains(id))
        .collect();
    if !missing_raters.is_empty() {
        let listed = missing_raters.into_iter().collect::<Vec<_>>().join(", ");
        return Err(InputError::UnknownRaters(listed));
    }

    let missing_candidates: BTreeSet<u32> = records
        .iter()
        .map(|r| r.candidate_id)
        .filter(|id| !known_candidates.contains(id))
        .collect();
    if !missing_candidates.is_empty() {
        let listed = missing_candidates
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        return Err(InputError::UnknownCandidates(listed));
    }

    Ok(())
}

/// The candidate roster is authoritative for group labels. A record whose
/// group cell disagrees is rewritten to the roster value with a warning.
/// Must run after `check_rosters`.
pub fn resolve_groups(mut records: Vec<ScoreRecord>, candidates: &[Candidate]) -> Vec<ScoreRecord> {
    let roster_group: HashMap<u32, &str> = candidates
        .iter()
        .map(|c| (c.candidate_id, c.group.as_str()))
        .collect();
    for record in &mut records {
        if let Some(&group) = roster_group.get(&record.candidate_id) {
            if record.group != group {
                warn!(
                    "score row for candidate {} carries group {:?} but the roster says {:?}; using the roster",
                    record.candidate_id, record.group, group
                );
                record.group = group.to_string();
            }
        }
    }
    records
}

/// Collapses duplicate (rater, candidate) rows to the first occurrence.
pub fn dedup_records(records: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    let mut seen: HashSet<(String, u32)> = HashSet::with_capacity(records.len());
    let n_before = records.len();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert((record.rater_id.clone(), record.candidate_id)) {
            out.push(record);
        }
    }
    let dropped = n_before - out.len();
    if dropped > 0 {
        warn!("dropped {dropped} duplicate (rater, candidate) score rows");
    }
    out
}
