/// Empirical score-value distribution for one rater within one group.
///
/// `fractions` is parallel to the stage-1 score domain; entries sum to 1.0
/// for any rater with at least one record in the group. Raters with zero
/// records in a group have no row at all.
#[derive(Debug, Clone)]
pub struct RaterProfile {
    pub rater_id: String,
    pub group: String,
    pub fractions: Vec<f64>,
    pub n_records: usize,
    /// Sum of |fraction - group baseline fraction| over the score domain.
    pub deviation: f64,
}

/// Mean of the profiles of all raters active in a group.
#[derive(Debug, Clone)]
pub struct GroupBaseline {
    pub group: String,
    pub fractions: Vec<f64>,
    pub n_raters: usize,
}

/// Per-rater credibility weight derived from total deviation across groups.
#[derive(Debug, Clone)]
pub struct RaterWeight {
    pub rater_id: String,
    pub deviation: f64,
    /// In (0, 1]; non-increasing as deviation grows.
    pub weight: f64,
    /// Unweighted mean of all scores this rater handed out.
    pub mean_given: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtremalScore {
    pub rater_id: String,
    pub score: i32,
}

#[derive(Debug, Clone)]
pub struct CandidateAggregate {
    pub candidate_id: u32,
    pub weighted_score: f64,
    pub unweighted_score: f64,
    pub rater_count: usize,
    pub lowest: ExtremalScore,
    pub highest: ExtremalScore,
}

/// Aggregate extended with global and group-local rank columns.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub aggregate: CandidateAggregate,
    pub group: String,
    pub rank: u32,
    pub percentile: f64,
    pub unweighted_rank: u32,
    pub rank_diff: i64,
    pub rank_in_group: u32,
    pub percentile_in_group: f64,
    pub unweighted_rank_in_group: u32,
    pub rank_diff_in_group: i64,
}
