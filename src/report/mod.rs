pub mod csv;
pub mod json;

use std::collections::HashMap;

use crate::model::records::{Candidate, Rater, ScoreRecord};
use crate::model::tables::{RankedResult, RaterWeight};
use crate::pipeline::stage1_profiles::run_stage1;

/// One line of the candidate results table, with rater ids already replaced
/// by roster display names.
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub candidate_id: u32,
    pub display_name: String,
    pub group: String,
    pub weighted_score: f64,
    pub unweighted_score: f64,
    pub rater_count: usize,
    pub rank: u32,
    pub percentile: f64,
    pub rank_by_group: u32,
    pub percentile_by_group: f64,
    pub rank_diff: i64,
    pub rank_diff_by_group: i64,
    pub lowest_rater: String,
    pub lowest_score: i32,
    pub highest_rater: String,
    pub highest_score: i32,
}

#[derive(Debug, Clone)]
pub struct RaterRow {
    pub rater_id: String,
    /// Overall (group-pooled) score-value fractions, parallel to the table's
    /// domain.
    pub fractions: Vec<f64>,
    pub deviation: f64,
    pub weight: f64,
    pub mean_given: f64,
}

/// Rater-weight table plus the score domain its fraction columns cover.
#[derive(Debug, Clone)]
pub struct RaterTable {
    pub domain: Vec<i32>,
    pub rows: Vec<RaterRow>,
}

/// Assembles result rows in rank order, substituting display names for the
/// extremal rater ids. Ids missing from the roster pass through unchanged.
pub fn build_result_rows(
    ranked: &[RankedResult],
    candidates: &[Candidate],
    raters: &[Rater],
) -> Vec<ResultRow> {
    let candidate_names: HashMap<u32, &str> = candidates
        .iter()
        .map(|c| (c.candidate_id, c.display_name.as_str()))
        .collect();
    let rater_names: HashMap<&str, &str> = raters
        .iter()
        .map(|r| (r.rater_id.as_str(), r.display_name.as_str()))
        .collect();
    let display = |rater_id: &str| -> String {
        rater_names
            .get(rater_id)
            .map(|&name| name.to_string())
            .unwrap_or_else(|| rater_id.to_string())
    };

    let mut rows: Vec<ResultRow> = ranked
        .iter()
        .map(|r| ResultRow {
            candidate_id: r.aggregate.candidate_id,
            display_name: candidate_names
                .get(&r.aggregate.candidate_id)
                .map(|&n| n.to_string())
                .unwrap_or_default(),
            group: r.group.clone(),
            weighted_score: r.aggregate.weighted_score,
            unweighted_score: r.aggregate.unweighted_score,
            rater_count: r.aggregate.rater_count,
            rank: r.rank,
            percentile: r.percentile,
            rank_by_group: r.rank_in_group,
            percentile_by_group: r.percentile_in_group,
            rank_diff: r.rank_diff,
            rank_diff_by_group: r.rank_diff_in_group,
            lowest_rater: display(&r.aggregate.lowest.rater_id),
            lowest_score: r.aggregate.lowest.score,
            highest_rater: display(&r.aggregate.highest.rater_id),
            highest_score: r.aggregate.highest.score,
        })
        .collect();
    rows.sort_by(|a, b| a.rank.cmp(&b.rank).then(a.candidate_id.cmp(&b.candidate_id)));
    rows
}

/// Assembles the rater-weight table. The fraction columns describe each
/// rater's overall distribution pooled across groups; deviation and weight
/// come from the weighting stage.
pub fn build_rater_table(records: &[ScoreRecord], weights: &[RaterWeight]) -> RaterTable {
    let pooled = run_stage1(records, false);
    let fractions_by_rater: HashMap<&str, &Vec<f64>> = pooled
        .profiles
        .iter()
        .map(|p| (p.rater_id.as_str(), &p.fractions))
        .collect();

    let rows = weights
        .iter()
        .map(|w| RaterRow {
            rater_id: w.rater_id.clone(),
            fractions: fractions_by_rater
                .get(w.rater_id.as_str())
                .map(|f| (*f).clone())
                .unwrap_or_else(|| vec![0.0; pooled.domain.len()]),
            deviation: w.deviation,
            weight: w.weight,
            mean_given: w.mean_given,
        })
        .collect();

    RaterTable {
        domain: pooled.domain,
        rows,
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}
