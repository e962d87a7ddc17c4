use std::collections::{BTreeMap, BTreeSet};

use crate::model::records::ScoreRecord;
use crate::model::tables::{GroupBaseline, RaterProfile};

/// Group label used for every record when group partitioning is disabled.
pub const POOLED_GROUP: &str = "all";

#[derive(Debug, Clone)]
pub struct Stage1Output {
    /// Sorted distinct score values observed across the whole dataset.
    /// Profile and baseline fraction vectors are parallel to it.
    pub domain: Vec<i32>,
    pub profiles: Vec<RaterProfile>,
    pub baselines: Vec<GroupBaseline>,
}

impl Stage1Output {
    pub fn baseline_for(&self, group: &str) -> Option<&GroupBaseline> {
        self.baselines.iter().find(|b| b.group == group)
    }
}

/// Builds per-(rater, group) score-value distributions and compares each to
/// its group's average distribution.
///
/// A rater with zero records in a group contributes no row for that group and
/// is excluded from that group's baseline; missing score values count as zero
/// frequency. With `group_split` disabled all records fall into one pooled
/// group with a single global baseline.
pub fn run_stage1(records: &[ScoreRecord], group_split: bool) -> Stage1Output {
    let domain: Vec<i32> = records
        .iter()
        .map(|r| r.score)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let value_index: BTreeMap<i32, usize> =
        domain.iter().enumerate().map(|(i, &v)| (v, i)).collect();

    // Grouped count pass: group -> rater -> per-value counts.
    let mut counts: BTreeMap<&str, BTreeMap<&str, Vec<usize>>> = BTreeMap::new();
    for record in records {
        let group = if group_split {
            record.group.as_str()
        } else {
            POOLED_GROUP
        };
        let row = counts
            .entry(group)
            .or_default()
            .entry(record.rater_id.as_str())
            .or_insert_with(|| vec![0; domain.len()]);
        row[value_index[&record.score]] += 1;
    }

    // One group at a time: fractions, then the baseline mean, then each
    // rater's deviation from it.
    let mut profiles: Vec<RaterProfile> = Vec::new();
    let mut baselines: Vec<GroupBaseline> = Vec::with_capacity(counts.len());
    for (&group, raters) in &counts {
        let mut group_profiles: Vec<RaterProfile> = raters
            .iter()
            .map(|(&rater_id, row)| {
                let n_records: usize = row.iter().sum();
                RaterProfile {
                    rater_id: rater_id.to_string(),
                    group: group.to_string(),
                    fractions: row
                        .iter()
                        .map(|&c| c as f64 / n_records as f64)
                        .collect(),
                    n_records,
                    deviation: 0.0,
                }
            })
            .collect();

        let n_raters = group_profiles.len();
        let mut baseline_fractions = vec![0.0; domain.len()];
        for profile in &group_profiles {
            for (sum, &f) in baseline_fractions.iter_mut().zip(&profile.fractions) {
                *sum += f;
            }
        }
        for sum in &mut baseline_fractions {
            *sum /= n_raters as f64;
        }

        for profile in &mut group_profiles {
            profile.deviation = profile
                .fractions
                .iter()
                .zip(&baseline_fractions)
                .map(|(f, b)| (f - b).abs())
                .sum();
        }

        baselines.push(GroupBaseline {
            group: group.to_string(),
            fractions: baseline_fractions,
            n_raters,
        });
        profiles.extend(group_profiles);
    }

    Stage1Output {
        domain,
        profiles,
        baselines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rater: &str, candidate: u32, score: i32, group: &str) -> ScoreRecord {
        ScoreRecord {
            rater_id: rater.to_string(),
            candidate_id: candidate,
            score,
            group: group.to_string(),
        }
    }

    #[test]
    fn test_fractions_sum_to_one_per_group_row() {
        let records = vec![
            record("a", 1, 5, "A"),
            record("a", 2, 3, "A"),
            record("a", 3, 5, "B"),
            record("b", 1, 4, "A"),
        ];
        let out = run_stage1(&records, true);
        for profile in &out.profiles {
            let total: f64 = profile.fractions.iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "{profile:?}");
        }
    }

    #[test]
    fn test_zero_record_group_has_no_row() {
        let records = vec![record("a", 1, 5, "A"), record("b", 2, 3, "B")];
        let out = run_stage1(&records, true);
        // Rater "a" never rated in group B; no (a, B) row may exist.
        assert!(
            !out.profiles
                .iter()
                .any(|p| p.rater_id == "a" && p.group == "B")
        );
        // And "a" is not averaged into B's baseline.
        assert_eq!(out.baseline_for("B").unwrap().n_raters, 1);
    }

    #[test]
    fn test_baseline_is_mean_of_active_raters() {
        // Domain {3, 5}: rater a always gives 5, rater b always gives 3.
        let records = vec![
            record("a", 1, 5, "A"),
            record("a", 2, 5, "A"),
            record("b", 1, 3, "A"),
        ];
        let out = run_stage1(&records, true);
        let baseline = out.baseline_for("A").unwrap();
        assert_eq!(out.domain, vec![3, 5]);
        assert!((baseline.fractions[0] - 0.5).abs() < 1e-9);
        assert!((baseline.fractions[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_deviation_is_sum_of_absolute_differences() {
        let records = vec![
            record("a", 1, 5, "A"),
            record("a", 2, 5, "A"),
            record("b", 1, 3, "A"),
        ];
        let out = run_stage1(&records, true);
        // a: [0, 1], b: [1, 0], baseline [0.5, 0.5] -> deviation 1.0 each.
        for profile in &out.profiles {
            assert!((profile.deviation - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unpartitioned_mode_pools_groups() {
        let records = vec![record("a", 1, 5, "A"), record("a", 2, 3, "B")];
        let out = run_stage1(&records, false);
        assert_eq!(out.profiles.len(), 1);
        assert_eq!(out.profiles[0].group, POOLED_GROUP);
        assert_eq!(out.profiles[0].n_records, 2);
        assert_eq!(out.baselines.len(), 1);
    }

    #[test]
    fn test_profiles_ordered_by_group_then_rater() {
        let records = vec![
            record("b", 1, 5, "B"),
            record("a", 2, 3, "A"),
            record("a", 1, 4, "B"),
        ];
        let out = run_stage1(&records, true);
        let keys: Vec<(&str, &str)> = out
            .profiles
            .iter()
            .map(|p| (p.group.as_str(), p.rater_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("A", "a"), ("B", "a"), ("B", "b")]);
        assert_eq!(out.baselines.len(), 2);
    }

    #[test]
    fn test_single_rater_group_deviates_zero() {
        let records = vec![record("a", 1, 5, "C"), record("a", 2, 1, "C")];
        let out = run_stage1(&records, true);
        assert!((out.profiles[0].deviation - 0.0).abs() < 1e-9);
    }
}
