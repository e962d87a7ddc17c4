pub mod stage1_profiles;
pub mod stage2_weights;
pub mod stage3_aggregate;
pub mod stage4_rank;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// All raters scoring a candidate carry zero total weight. Distinct from
    /// a normal low-confidence score; never divided through.
    #[error("degenerate weights: total rater weight for candidate {candidate_id} is zero")]
    DegenerateWeights { candidate_id: u32 },
    /// A record's rater has no weight row. Means a stage was skipped or fed
    /// mismatched tables.
    #[error("no weight computed for rater {rater_id}; weight assignment did not cover the records")]
    MissingWeight { rater_id: String },
    /// A later stage was invoked without the output a prior stage should
    /// have produced.
    #[error("precondition violated: {0}")]
    Precondition(String),
}
