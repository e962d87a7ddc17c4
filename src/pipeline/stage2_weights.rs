use std::collections::BTreeMap;

use tracing::info;

use crate::model::policy::{CutoffBand, WeightPolicy};
use crate::model::tables::RaterWeight;
use crate::pipeline::stage1_profiles::Stage1Output;

/// Maps each rater's total deviation to a credibility weight under the
/// selected policy.
///
/// The deviation per rater is the sum of the per-group deviations of all
/// their profile rows, so a rater active in several groups is judged on the
/// whole pattern. Weights are non-increasing in deviation for any valid
/// cutoff table.
pub fn run_stage2(stage1: &Stage1Output, policy: &WeightPolicy) -> Vec<RaterWeight> {
    // (deviation sum, score sum, record count) per rater, in id order.
    let mut totals: BTreeMap<&str, (f64, f64, usize)> = BTreeMap::new();
    for profile in &stage1.profiles {
        let entry = totals.entry(profile.rater_id.as_str()).or_insert((0.0, 0.0, 0));
        entry.0 += profile.deviation;
        for (&value, &fraction) in stage1.domain.iter().zip(&profile.fractions) {
            entry.1 += value as f64 * fraction * profile.n_records as f64;
        }
        entry.2 += profile.n_records;
    }

    let deviations: Vec<f64> = totals.values().map(|&(d, _, _)| d).collect();
    let thresholds = realized_thresholds(policy, &deviations);

    totals
        .into_iter()
        .map(|(rater_id, (deviation, score_sum, n_records))| {
            let weight = match &thresholds {
                Some(bands) => band_weight(bands, deviation),
                None => 1.0,
            };
            RaterWeight {
                rater_id: rater_id.to_string(),
                deviation,
                weight,
                mean_given: score_sum / n_records as f64,
            }
        })
        .collect()
}

/// Turns the policy into an absolute-deviation cutoff table for this run.
/// `None` means uniform weighting.
fn realized_thresholds(policy: &WeightPolicy, deviations: &[f64]) -> Option<Vec<CutoffBand>> {
    match policy {
        WeightPolicy::Uniform => None,
        WeightPolicy::FixedCutoff { bands } => Some(bands.clone()),
        WeightPolicy::PercentileCutoff { bands } => {
            let realized: Vec<CutoffBand> = bands
                .iter()
                .map(|band| CutoffBand {
                    threshold: quantile_linear(deviations, band.threshold),
                    weight: band.weight,
                })
                .collect();
            info!(
                "realized percentile cutoffs against this run's deviations: {}",
                realized
                    .iter()
                    .map(|b| format!("{:.4}->{}", b.threshold, b.weight))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Some(realized)
        }
    }
}

/// Smallest qualifying threshold wins; the boundary is inclusive. Deviations
/// beyond the last threshold clamp to the last band's weight.
fn band_weight(bands: &[CutoffBand], deviation: f64) -> f64 {
    for band in bands {
        if deviation <= band.threshold {
            return band.weight;
        }
    }
    bands.last().map(|b| b.weight).unwrap_or(1.0)
}

/// Empirical quantile with linear interpolation between order statistics
/// (h = (n - 1) * p, the numpy/pandas "linear" rule). Different interpolation
/// rules move weights near cutoff boundaries, so this one is fixed here.
pub fn quantile_linear(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let p = p.clamp(0.0, 1.0);
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = h - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::records::ScoreRecord;
    use crate::pipeline::stage1_profiles::run_stage1;

    fn record(rater: &str, candidate: u32, score: i32, group: &str) -> ScoreRecord {
        ScoreRecord {
            rater_id: rater.to_string(),
            candidate_id: candidate,
            score,
            group: group.to_string(),
        }
    }

    fn fixed(bands: &[(f64, f64)]) -> WeightPolicy {
        WeightPolicy::FixedCutoff {
            bands: bands
                .iter()
                .map(|&(threshold, weight)| CutoffBand { threshold, weight })
                .collect(),
        }
    }

    #[test]
    fn test_boundary_deviation_is_inclusive() {
        let bands = vec![
            CutoffBand { threshold: 0.5, weight: 1.0 },
            CutoffBand { threshold: 1.0, weight: 0.6 },
        ];
        assert_eq!(band_weight(&bands, 0.5), 1.0);
        assert_eq!(band_weight(&bands, 1.0), 0.6);
        assert_eq!(band_weight(&bands, 0.7), 0.6);
    }

    #[test]
    fn test_deviation_beyond_last_threshold_clamps() {
        let bands = vec![
            CutoffBand { threshold: 0.5, weight: 1.0 },
            CutoffBand { threshold: 1.0, weight: 0.6 },
        ];
        assert_eq!(band_weight(&bands, 7.5), 0.6);
    }

    #[test]
    fn test_quantile_linear_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert!((quantile_linear(&values, 0.5) - 2.5).abs() < 1e-9);
        assert!((quantile_linear(&values, 0.0) - 1.0).abs() < 1e-9);
        assert!((quantile_linear(&values, 1.0) - 4.0).abs() < 1e-9);
        assert!((quantile_linear(&values, 0.25) - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_linear_single_value() {
        assert_eq!(quantile_linear(&[2.5], 0.9), 2.5);
    }

    #[test]
    fn test_fixed_policy_thresholds_pass_through_unrealized() {
        let bands = vec![
            CutoffBand { threshold: 0.5, weight: 1.0 },
            CutoffBand { threshold: 1.0, weight: 0.6 },
        ];
        let policy = WeightPolicy::FixedCutoff { bands: bands.clone() };
        assert_eq!(realized_thresholds(&policy, &[0.1, 0.9]), Some(bands));
        assert_eq!(realized_thresholds(&WeightPolicy::Uniform, &[0.1]), None);
    }

    #[test]
    fn test_uniform_policy_assigns_weight_one() {
        let records = vec![record("a", 1, 5, "A"), record("b", 1, 3, "A")];
        let stage1 = run_stage1(&records, true);
        let weights = run_stage2(&stage1, &WeightPolicy::Uniform);
        assert!(weights.iter().all(|w| w.weight == 1.0));
    }

    #[test]
    fn test_deviation_sums_across_groups() {
        // Rater a deviates by 1.0 in each of groups A and B (see stage1
        // deviation test); its total must be 2.0.
        let records = vec![
            record("a", 1, 5, "A"),
            record("b", 1, 3, "A"),
            record("a", 2, 5, "B"),
            record("c", 2, 3, "B"),
        ];
        let stage1 = run_stage1(&records, true);
        let weights = run_stage2(&stage1, &WeightPolicy::Uniform);
        let a = weights.iter().find(|w| w.rater_id == "a").unwrap();
        assert!((a.deviation - 2.0).abs() < 1e-9);
        let b = weights.iter().find(|w| w.rater_id == "b").unwrap();
        assert!((b.deviation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_policy_separates_conformist_from_outlier() {
        // a and b agree (deviation small), c scores opposite to the crowd.
        let records = vec![
            record("a", 1, 4, "A"),
            record("a", 2, 4, "A"),
            record("b", 1, 4, "A"),
            record("b", 2, 4, "A"),
            record("c", 1, 1, "A"),
            record("c", 2, 1, "A"),
        ];
        let stage1 = run_stage1(&records, true);
        let policy = fixed(&[(0.7, 1.0), (2.0, 0.5)]);
        let weights = run_stage2(&stage1, &policy);
        let a = weights.iter().find(|w| w.rater_id == "a").unwrap();
        let c = weights.iter().find(|w| w.rater_id == "c").unwrap();
        assert_eq!(a.weight, 1.0);
        assert_eq!(c.weight, 0.5);
        assert!(c.deviation > a.deviation);
    }

    #[test]
    fn test_percentile_policy_adapts_to_run_distribution() {
        let records = vec![
            record("a", 1, 4, "A"),
            record("a", 2, 4, "A"),
            record("b", 1, 4, "A"),
            record("b", 2, 4, "A"),
            record("c", 1, 1, "A"),
            record("c", 2, 1, "A"),
        ];
        let stage1 = run_stage1(&records, true);
        // Everything at or below the median keeps weight 1.0; only the
        // extreme tail is down-weighted.
        let policy = WeightPolicy::PercentileCutoff {
            bands: vec![
                CutoffBand { threshold: 0.50, weight: 1.0 },
                CutoffBand { threshold: 0.99, weight: 0.4 },
            ],
        };
        let weights = run_stage2(&stage1, &policy);
        let a = weights.iter().find(|w| w.rater_id == "a").unwrap();
        let c = weights.iter().find(|w| w.rater_id == "c").unwrap();
        assert_eq!(a.weight, 1.0);
        assert_eq!(c.weight, 0.4);
    }

    #[test]
    fn test_mean_given_matches_raw_scores() {
        let records = vec![
            record("a", 1, 5, "A"),
            record("a", 2, 3, "B"),
            record("a", 3, 4, "A"),
        ];
        let stage1 = run_stage1(&records, true);
        let weights = run_stage2(&stage1, &WeightPolicy::Uniform);
        assert!((weights[0].mean_given - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_weight_non_increasing_in_deviation() {
        let records = vec![
            record("a", 1, 4, "A"),
            record("b", 1, 4, "A"),
            record("c", 1, 2, "A"),
            record("d", 1, 1, "A"),
        ];
        let stage1 = run_stage1(&records, true);
        let weights = run_stage2(&stage1, &WeightPolicy::fixed_v1());
        let mut by_deviation = weights.clone();
        by_deviation.sort_by(|x, y| x.deviation.partial_cmp(&y.deviation).unwrap());
        for pair in by_deviation.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }
}
