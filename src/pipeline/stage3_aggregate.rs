use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use tracing::warn;

use crate::model::records::{Candidate, ScoreRecord};
use crate::model::tables::{CandidateAggregate, ExtremalScore, RaterWeight};
use crate::pipeline::PipelineError;

/// Computes per-candidate weighted and unweighted means plus extremal raters.
///
/// weighted = sum(score * rater weight) / sum(rater weight). With all weights
/// equal the weighted mean reduces to the unweighted one. When several raters
/// tie for the lowest (or highest) raw score, one is chosen uniformly at
/// random from `rng`; everything else in the stage is deterministic.
///
/// Roster candidates with zero records are excluded with a warning. A zero
/// weight sum is reported as a degenerate-weight error, not divided through.
pub fn run_stage3(
    records: &[ScoreRecord],
    weights: &[RaterWeight],
    candidates: &[Candidate],
    rng: &mut impl Rng,
) -> Result<Vec<CandidateAggregate>, PipelineError> {
    let weight_by_rater: HashMap<&str, f64> = weights
        .iter()
        .map(|w| (w.rater_id.as_str(), w.weight))
        .collect();

    let mut rows_by_candidate: BTreeMap<u32, Vec<&ScoreRecord>> = BTreeMap::new();
    for record in records {
        rows_by_candidate
            .entry(record.candidate_id)
            .or_default()
            .push(record);
    }

    let mut aggregates = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let Some(rows) = rows_by_candidate.get(&candidate.candidate_id) else {
            warn!(
                "candidate {} ({}) has no score records; excluded from aggregation",
                candidate.candidate_id, candidate.display_name
            );
            continue;
        };

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut raw_sum = 0.0;
        for row in rows {
            let weight = *weight_by_rater.get(row.rater_id.as_str()).ok_or_else(|| {
                PipelineError::MissingWeight {
                    rater_id: row.rater_id.clone(),
                }
            })?;
            weighted_sum += row.score as f64 * weight;
            weight_sum += weight;
            raw_sum += row.score as f64;
        }
        if weight_sum <= 0.0 {
            return Err(PipelineError::DegenerateWeights {
                candidate_id: candidate.candidate_id,
            });
        }

        let min_score = rows.iter().map(|r| r.score).min().expect("rows non-empty");
        let max_score = rows.iter().map(|r| r.score).max().expect("rows non-empty");
        let lowest = pick_tied(rows, min_score, rng);
        let highest = pick_tied(rows, max_score, rng);

        aggregates.push(CandidateAggregate {
            candidate_id: candidate.candidate_id,
            weighted_score: weighted_sum / weight_sum,
            unweighted_score: raw_sum / rows.len() as f64,
            rater_count: rows.len(),
            lowest,
            highest,
        });
    }

    Ok(aggregates)
}

fn pick_tied(rows: &[&ScoreRecord], score: i32, rng: &mut impl Rng) -> ExtremalScore {
    let tied: Vec<&&ScoreRecord> = rows.iter().filter(|r| r.score == score).collect();
    let chosen = tied[rng.gen_range(0..tied.len())];
    ExtremalScore {
        rater_id: chosen.rater_id.clone(),
        score,
    }
}
