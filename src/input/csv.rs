use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::input::InputError;

/// A parsed CSV body row together with its 1-based line number, kept for
/// error reporting.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line_no: usize,
    pub cells: Vec<String>,
}

/// Reads a header-checked CSV file. The header must match `expected_header`
/// column-for-column (case-insensitive); every body row must have the same
/// number of cells. Cells are trimmed; quoting is not interpreted, the input
/// files are machine-generated exports.
pub fn read_rows(path: &Path, expected_header: &[&str]) -> Result<Vec<CsvRow>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let mut buf = String::new();

    let read = reader.read_line(&mut buf).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if read == 0 {
        return Err(InputError::Empty {
            path: path.display().to_string(),
        });
    }
    let header: Vec<String> = split_cells(buf.trim_end());
    if header.len() != expected_header.len()
        || !header
            .iter()
            .zip(expected_header)
            .all(|(got, want)| got.eq_ignore_ascii_case(want))
    {
        return Err(InputError::Header {
            path: path.display().to_string(),
            expected: expected_header.join(","),
            found: header.join(","),
        });
    }

    let mut rows = Vec::new();
    let mut line_no = 1usize;
    loop {
        buf.clear();
        let read = reader.read_line(&mut buf).map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        let cells = split_cells(line);
        if cells.len() != expected_header.len() {
            return Err(InputError::Row {
                path: path.display().to_string(),
                line_no,
                message: format!(
                    "expected {} columns, found {}",
                    expected_header.len(),
                    cells.len()
                ),
            });
        }
        rows.push(CsvRow { line_no, cells });
    }

    Ok(rows)
}

fn split_cells(line: &str) -> Vec<String> {
    line.split(',').map(|c| c.trim().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("bicker-rank-csv-{name}"));
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_reads_rows_with_matching_header() {
        let path = write_temp("ok.csv", "a,b\n1, x \n2,y\n");
        let rows = read_rows(&path, &["a", "b"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells, vec!["1".to_string(), "x".to_string()]);
        assert_eq!(rows[1].line_no, 3);
    }

    #[test]
    fn test_header_mismatch_is_rejected() {
        let path = write_temp("badheader.csv", "a,c\n1,2\n");
        let err = read_rows(&path, &["a", "b"]).unwrap_err();
        assert!(matches!(err, InputError::Header { .. }));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let path = write_temp("ragged.csv", "a,b\n1\n");
        let err = read_rows(&path, &["a", "b"]).unwrap_err();
        assert!(matches!(err, InputError::Row { line_no: 2, .. }));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let path = write_temp("empty.csv", "");
        let err = read_rows(&path, &["a", "b"]).unwrap_err();
        assert!(matches!(err, InputError::Empty { .. }));
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let path = write_temp("blank.csv", "a,b\n\n1,2\n\n");
        let rows = read_rows(&path, &["a", "b"]).unwrap();
        assert_eq!(rows.len(), 1);
    }
}
