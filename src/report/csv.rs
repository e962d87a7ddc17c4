use std::path::Path;

use crate::report::{RaterTable, ResultRow, format_f64_6};

/// Writes the candidate results table, one row per ranked candidate.
pub fn write_results_csv(path: &Path, rows: &[ResultRow]) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str(
        "candidate_id,display_name,candidate_group,weighted_score,unweighted_score,rater_count,\
         rank,percentile,rank_by_group,percentile_by_group,rank_diff,rank_diff_by_group,\
         lowest_rater,lowest_score,highest_rater,highest_score\n",
    );
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            row.candidate_id,
            escape(&row.display_name),
            escape(&row.group),
            format_f64_6(row.weighted_score),
            format_f64_6(row.unweighted_score),
            row.rater_count,
            row.rank,
            format_f64_6(row.percentile),
            row.rank_by_group,
            format_f64_6(row.percentile_by_group),
            row.rank_diff,
            row.rank_diff_by_group,
            escape(&row.lowest_rater),
            row.lowest_score,
            escape(&row.highest_rater),
            row.highest_score,
        ));
    }
    std::fs::write(path, out)
}

/// Writes the rater-weight table with one fraction column per score value.
pub fn write_rater_weights_csv(path: &Path, table: &RaterTable) -> std::io::Result<()> {
    let mut out = String::new();
    out.push_str("rater_id");
    for value in &table.domain {
        out.push_str(&format!(",frac_{value}"));
    }
    out.push_str(",deviation,weight,mean_given\n");
    for row in &table.rows {
        out.push_str(&escape(&row.rater_id));
        for fraction in &row.fractions {
            out.push(',');
            out.push_str(&format_f64_6(*fraction));
        }
        out.push_str(&format!(
            ",{},{},{}\n",
            format_f64_6(row.deviation),
            format_f64_6(row.weight),
            format_f64_6(row.mean_given),
        ));
    }
    std::fs::write(path, out)
}

fn escape(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RaterRow;

    fn row() -> ResultRow {
        ResultRow {
            candidate_id: 7,
            display_name: "Doe, Jane".to_string(),
            group: "A".to_string(),
            weighted_score: 4.25,
            unweighted_score: 4.0,
            rater_count: 3,
            rank: 1,
            percentile: 1.0,
            rank_by_group: 1,
            percentile_by_group: 1.0,
            rank_diff: 0,
            rank_diff_by_group: 0,
            lowest_rater: "Ada".to_string(),
            lowest_score: 3,
            highest_rater: "Ben".to_string(),
            highest_score: 5,
        }
    }

    #[test]
    fn test_results_csv_shape() {
        let path = std::env::temp_dir().join("bicker-rank-results-test.csv");
        write_results_csv(&path, &[row()]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("candidate_id,display_name"));
        assert!(lines[1].starts_with("7,\"Doe, Jane\",A,4.250000,4.000000,3,1,"));
        assert_eq!(
            lines[0].split(',').count(),
            // The quoted comma in the name adds one raw comma to the row.
            lines[1].split(',').count() - 1
        );
    }

    #[test]
    fn test_rater_weights_csv_has_fraction_column_per_value() {
        let path = std::env::temp_dir().join("bicker-rank-weights-test.csv");
        let table = RaterTable {
            domain: vec![1, 3, 5],
            rows: vec![RaterRow {
                rater_id: "a@x.org".to_string(),
                fractions: vec![0.25, 0.5, 0.25],
                deviation: 0.4,
                weight: 1.0,
                mean_given: 3.0,
            }],
        };
        write_rater_weights_csv(&path, &table).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "rater_id,frac_1,frac_3,frac_5,deviation,weight,mean_given"
        );
        assert_eq!(
            lines[1],
            "a@x.org,0.250000,0.500000,0.250000,0.400000,1.000000,3.000000"
        );
    }
}
