use std::path::Path;

pub mod csv;
pub mod validate;

use tracing::{info, warn};

use crate::model::records::{Candidate, Rater, ScoreRecord};
use csv::read_rows;

pub const SCORES_HEADER: [&str; 4] = ["rater_id", "candidate_id", "score", "candidate_group"];
pub const CANDIDATES_HEADER: [&str; 3] = ["candidate_id", "display_name", "candidate_group"];
pub const RATERS_HEADER: [&str; 2] = ["rater_id", "display_name"];

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is empty")]
    Empty { path: String },
    #[error("{path}: expected header \"{expected}\", found \"{found}\"")]
    Header {
        path: String,
        expected: String,
        found: String,
    },
    #[error("{path} line {line_no}: {message}")]
    Row {
        path: String,
        line_no: usize,
        message: String,
    },
    #[error("score records reference rater ids missing from the rater roster: {0}")]
    UnknownRaters(String),
    #[error("score records reference candidate ids missing from the candidate roster: {0}")]
    UnknownCandidates(String),
    #[error("no score records remain after cleanup")]
    NoRecords,
}

/// Validated, deduplicated inputs ready for the pipeline.
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub records: Vec<ScoreRecord>,
    pub candidates: Vec<Candidate>,
    pub raters: Vec<Rater>,
    /// Raw score rows before dedup/NA cleanup, for the run summary.
    pub n_raw_rows: usize,
}

/// Loads the three input CSVs, checks roster completeness, and applies the
/// dedup/NA cleanup. Records that survive are exactly the rows the core
/// pipeline consumes.
pub fn load_input(
    scores_path: &Path,
    raters_path: &Path,
    candidates_path: &Path,
) -> Result<InputBundle, InputError> {
    let raters = load_raters(raters_path)?;
    let candidates = load_candidates(candidates_path)?;
    let (records, n_raw_rows) = load_scores(scores_path)?;

    info!(
        "loaded {} score rows, {} raters, {} candidates",
        n_raw_rows,
        raters.len(),
        candidates.len()
    );

    validate::check_rosters(&records, &raters, &candidates)?;
    let records = validate::resolve_groups(records, &candidates);
    let records = validate::dedup_records(records);
    if records.is_empty() {
        return Err(InputError::NoRecords);
    }

    Ok(InputBundle {
        records,
        candidates,
        raters,
        n_raw_rows,
    })
}

fn load_scores(path: &Path) -> Result<(Vec<ScoreRecord>, usize), InputError> {
    let rows = read_rows(path, &SCORES_HEADER)?;
    let n_raw_rows = rows.len();
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.cells[2].is_empty() {
            warn!(
                "dropping score row with empty score cell ({} line {})",
                path.display(),
                row.line_no
            );
            continue;
        }
        let candidate_id = parse_u32(path, row.line_no, "candidate_id", &row.cells[1])?;
        let score = parse_i32(path, row.line_no, "score", &row.cells[2])?;
        records.push(ScoreRecord {
            rater_id: row.cells[0].clone(),
            candidate_id,
            score,
            group: row.cells[3].clone(),
        });
    }
    Ok((records, n_raw_rows))
}

fn load_candidates(path: &Path) -> Result<Vec<Candidate>, InputError> {
    let rows = read_rows(path, &CANDIDATES_HEADER)?;
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let candidate_id = parse_u32(path, row.line_no, "candidate_id", &row.cells[0])?;
        out.push(Candidate {
            candidate_id,
            display_name: row.cells[1].clone(),
            group: row.cells[2].clone(),
        });
    }
    Ok(out)
}

fn load_raters(path: &Path) -> Result<Vec<Rater>, InputError> {
    let rows = read_rows(path, &RATERS_HEADER)?;
    Ok(rows
        .into_iter()
        .map(|row| Rater {
            rater_id: row.cells[0].clone(),
            display_name: row.cells[1].clone(),
        })
        .collect())
}

fn parse_u32(path: &Path, line_no: usize, column: &str, cell: &str) -> Result<u32, InputError> {
    cell.parse::<u32>().map_err(|_| InputError::Row {
        path: path.display().to_string(),
        line_no,
        message: format!("{column} is not a non-negative integer: {cell:?}"),
    })
}

fn parse_i32(path: &Path, line_no: usize, column: &str, cell: &str) -> Result<i32, InputError> {
    cell.parse::<i32>().map_err(|_| InputError::Row {
        path: path.display().to_string(),
        line_no,
        message: format!("{column} is not an integer: {cell:?}"),
    })
}
