/// One deduplicated (rater, candidate) scoring row. The group label is the
/// candidate's group as resolved against the candidate roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub rater_id: String,
    pub candidate_id: u32,
    pub score: i32,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub candidate_id: u32,
    pub display_name: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rater {
    pub rater_id: String,
    pub display_name: String,
}
