use std::collections::HashMap;

use crate::model::records::Candidate;
use crate::model::tables::{CandidateAggregate, RankedResult};
use crate::pipeline::PipelineError;

/// Derives rank and percentile columns from the aggregates.
///
/// Rank 1 is the highest weighted score; ties share the lowest rank index
/// among them and the next distinct value continues at
/// count-of-strictly-better + 1. Percentile is the fraction of candidates
/// whose weighted score is <= this one, so the top scorer sits at 1.0.
/// Both are repeated per candidate group and over the unweighted scores;
/// rank_diff = unweighted rank - weighted rank, positive when weighting
/// improved the candidate's position.
pub fn run_stage4(
    aggregates: &[CandidateAggregate],
    candidates: &[Candidate],
) -> Result<Vec<RankedResult>, PipelineError> {
    if aggregates.is_empty() {
        return Err(PipelineError::Precondition(
            "no candidate aggregates to rank".to_string(),
        ));
    }
    for aggregate in aggregates {
        if !aggregate.weighted_score.is_finite() || !aggregate.unweighted_score.is_finite() {
            return Err(PipelineError::Precondition(format!(
                "candidate {} has a non-finite score; aggregation did not complete",
                aggregate.candidate_id
            )));
        }
    }

    let group_by_candidate: HashMap<u32, &str> = candidates
        .iter()
        .map(|c| (c.candidate_id, c.group.as_str()))
        .collect();
    let groups: Vec<&str> = aggregates
        .iter()
        .map(|a| {
            group_by_candidate
                .get(&a.candidate_id)
                .copied()
                .unwrap_or("")
        })
        .collect();

    let weighted: Vec<f64> = aggregates.iter().map(|a| a.weighted_score).collect();
    let unweighted: Vec<f64> = aggregates.iter().map(|a| a.unweighted_score).collect();

    let rank = min_ranks_desc(&weighted);
    let percentile = leq_percentiles(&weighted);
    let unweighted_rank = min_ranks_desc(&unweighted);

    let (rank_in_group, percentile_in_group) = per_group(&weighted, &groups);
    let (unweighted_rank_in_group, _) = per_group(&unweighted, &groups);

    Ok(aggregates
        .iter()
        .enumerate()
        .map(|(i, aggregate)| RankedResult {
            aggregate: aggregate.clone(),
            group: groups[i].to_string(),
            rank: rank[i],
            percentile: percentile[i],
            unweighted_rank: unweighted_rank[i],
            rank_diff: unweighted_rank[i] as i64 - rank[i] as i64,
            rank_in_group: rank_in_group[i],
            percentile_in_group: percentile_in_group[i],
            unweighted_rank_in_group: unweighted_rank_in_group[i],
            rank_diff_in_group: unweighted_rank_in_group[i] as i64 - rank_in_group[i] as i64,
        })
        .collect())
}

/// Minimum-method ranks, descending: rank = 1 + number of strictly better
/// scores, so [5.0, 5.0, 3.0] ranks [1, 1, 3].
fn min_ranks_desc(scores: &[f64]) -> Vec<u32> {
    scores
        .iter()
        .map(|&s| 1 + scores.iter().filter(|&&other| other > s).count() as u32)
        .collect()
}

/// Fraction of scores <= this one.
fn leq_percentiles(scores: &[f64]) -> Vec<f64> {
    let n = scores.len() as f64;
    scores
        .iter()
        .map(|&s| scores.iter().filter(|&&other| other <= s).count() as f64 / n)
        .collect()
}

/// Runs rank/percentile independently within each group partition and
/// scatters the results back to record positions.
fn per_group(scores: &[f64], groups: &[&str]) -> (Vec<u32>, Vec<f64>) {
    let mut ranks = vec![0u32; scores.len()];
    let mut percentiles = vec![0.0f64; scores.len()];
    let mut seen: Vec<&str> = Vec::new();
    for &group in groups {
        if seen.contains(&group) {
            continue;
        }
        seen.push(group);
        let indices: Vec<usize> = (0..scores.len()).filter(|&i| groups[i] == group).collect();
        let subset: Vec<f64> = indices.iter().map(|&i| scores[i]).collect();
        let sub_ranks = min_ranks_desc(&subset);
        let sub_pcts = leq_percentiles(&subset);
        for (pos, &i) in indices.iter().enumerate() {
            ranks[i] = sub_ranks[pos];
            percentiles[i] = sub_pcts[pos];
        }
    }
    (ranks, percentiles)
}
