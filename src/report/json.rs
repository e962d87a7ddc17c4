use std::path::Path;

use serde::Serialize;

use crate::model::policy::WeightPolicy;

/// Machine-readable run metadata written next to the CSV tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool_name: String,
    pub tool_version: String,
    pub policy: WeightPolicy,
    pub group_split: bool,
    pub seed: Option<u64>,
    pub n_raw_score_rows: usize,
    pub n_score_records: usize,
    pub n_raters: usize,
    pub n_candidates: usize,
    pub n_ranked: usize,
    pub outputs: Vec<String>,
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> std::io::Result<()> {
    let body = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serializes_policy_tag() {
        let path = std::env::temp_dir().join("bicker-rank-summary-test.json");
        let summary = RunSummary {
            tool_name: "bicker-rank".to_string(),
            tool_version: "0.0.0".to_string(),
            policy: WeightPolicy::percentile_v1(),
            group_split: true,
            seed: Some(42),
            n_raw_score_rows: 10,
            n_score_records: 9,
            n_raters: 3,
            n_candidates: 4,
            n_ranked: 4,
            outputs: vec!["results.csv".to_string()],
        };
        write_summary_json(&path, &summary).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["policy"]["mode"], "percentile_cutoff");
        assert_eq!(parsed["seed"], 42);
        assert_eq!(parsed["n_score_records"], 9);
    }
}
