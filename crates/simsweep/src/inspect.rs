//! Read-only summary of an existing results log.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use simsweep_core::log::{COMMENT_COLUMN, ERROR_COLUMN, parse_line};
use simsweep_core::model::NO_ERROR;

/// A failed run as recorded in the log
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRow {
    /// 1-based data row number
    pub row: usize,
    /// Non-empty data cells, as `column=value`
    pub parameters: Vec<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogReport {
    pub header: Vec<String>,
    pub rows: usize,
    pub failed: Vec<FailedRow>,
    /// Data rows whose field count differs from the header
    pub malformed: Vec<usize>,
}

impl LogReport {
    pub fn parse(content: &str) -> Self {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Self::default();
        };

        let header = parse_line(header_line);
        let error_idx = header.iter().position(|c| c == ERROR_COLUMN);
        let mut report = Self {
            header,
            ..Self::default()
        };

        for (i, line) in lines.enumerate() {
            let row = i + 1;
            report.rows += 1;
            let fields = parse_line(line);
            if fields.len() != report.header.len() {
                report.malformed.push(row);
            }

            let Some(error) = error_idx.and_then(|idx| fields.get(idx)) else {
                continue;
            };
            if error.is_empty() || error == NO_ERROR {
                continue;
            }
            let parameters = report
                .header
                .iter()
                .zip(&fields)
                .take_while(|(column, _)| *column != ERROR_COLUMN && *column != COMMENT_COLUMN)
                .filter(|(_, value)| !value.is_empty())
                .map(|(column, value)| format!("{column}={value}"))
                .collect();
            report.failed.push(FailedRow {
                row,
                parameters,
                error: error.clone(),
            });
        }
        report
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }
}

impl fmt::Display for LogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Columns ({}): {}", self.header.len(), self.header.join(", "))?;
        writeln!(f, "Rows: {} ({} failed)", self.rows, self.failed.len())?;
        for failed in &self.failed {
            writeln!(
                f,
                "  row {}: {} [{}]",
                failed.row,
                failed.error,
                failed.parameters.join(", ")
            )?;
        }
        if !self.malformed.is_empty() {
            let rows: Vec<String> = self.malformed.iter().map(usize::to_string).collect();
            writeln!(f, "Malformed rows: {}", rows.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "Back Offset, Drag Coefficient[none], Iteration, Error, Comment\n\
6, 0.31, 1000, N/A, baseline\n\
8, , , mesh failed, baseline\n\
10, 0.29, 1000, N/A\n";

    #[test]
    fn test_counts_and_failures() {
        let report = LogReport::parse(LOG);

        assert_eq!(report.header.len(), 5);
        assert_eq!(report.rows, 3);
        assert_eq!(
            report.failed,
            vec![FailedRow {
                row: 2,
                parameters: vec!["Back Offset=8".into()],
                error: "mesh failed".into(),
            }]
        );
        assert_eq!(report.malformed, vec![3]);
    }

    #[test]
    fn test_empty_log() {
        let report = LogReport::parse("");
        assert!(report.header.is_empty());
        assert_eq!(report.rows, 0);
    }

    #[test]
    fn test_display_lists_failures() {
        let text = LogReport::parse(LOG).to_string();
        assert!(text.contains("Rows: 3 (1 failed)"));
        assert!(text.contains("row 2: mesh failed [Back Offset=8]"));
        assert!(text.contains("Malformed rows: 3"));
    }
}
