//! Append-only results log with a schema discovered at first use.
//!
//! The log is a delimiter-separated text file. Its header is derived once from
//! the live simulation (parameters, metric series, fixed derived columns) and
//! frozen: re-opening an existing log reads the header back instead of
//! rebuilding it.
//!
//! ```text
//! Back Offset, Drag Coefficient[none], Total Meshing Time [min], Cell Count, ..., Error, Comment
//! 6, 0.312, 1.25, 48211, ..., N/A, baseline
//! 8, , , , ..., mesh failed, baseline
//! ```
//!
//! Every append opens, writes, flushes and closes the file so a crash loses at
//! most the row in flight.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::engine::Simulation;
use crate::error::{ConfigurationError, LogWriteError};
use crate::model::{MetricCategory, MetricSeries, ParameterSet, RunOutcome, format_value};

/// Field separator for header and data lines.
pub const DELIMITER: &str = ", ";

/// Derived columns written between reports and residuals.
pub const DERIVED_COLUMNS: [&str; 5] = [
    "Total Meshing Time [min]",
    "Cell Count",
    "Face Count",
    "Vertex Count",
    "Iteration",
];

pub const ERROR_COLUMN: &str = "Error";
pub const COMMENT_COLUMN: &str = "Comment";

/// Frozen, ordered list of data columns. The trailing error and comment
/// columns are implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    columns: Vec<String>,
}

impl RowSchema {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns: columns.iter().map(|c| column_name(c)).collect(),
        }
    }

    /// Rebuild a schema from a header line written by [`RowSchema::header_line`].
    pub fn from_header(line: &str) -> Self {
        let mut columns = parse_line(line);
        if columns.last().map(String::as_str) == Some(COMMENT_COLUMN) {
            columns.pop();
        }
        if columns.last().map(String::as_str) == Some(ERROR_COLUMN) {
            columns.pop();
        }
        Self { columns }
    }

    /// Data columns, excluding the trailing error and comment columns
    pub fn data_columns(&self) -> &[String] {
        &self.columns
    }

    /// Total column count including the trailing columns
    pub fn width(&self) -> usize {
        self.columns.len() + 2
    }

    pub fn header_line(&self) -> String {
        self.columns
            .iter()
            .map(String::as_str)
            .chain([ERROR_COLUMN, COMMENT_COLUMN])
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }
}

/// Enumerate the live simulation once and build the column list.
///
/// Order: parameters, coefficients, reports, [`DERIVED_COLUMNS`], residuals.
pub fn discover_schema<S: Simulation + ?Sized>(sim: &S) -> Result<RowSchema, ConfigurationError> {
    let mut columns = Vec::new();

    tracing::info!("|--Getting parameters...");
    columns.extend(sim.parameters()?.into_iter().map(|p| p.name));

    tracing::info!("|--Getting coefficients...");
    columns.extend(
        sim.metric_series(MetricCategory::Coefficients)?
            .iter()
            .map(metric_column),
    );

    tracing::info!("|--Getting reports...");
    columns.extend(
        sim.metric_series(MetricCategory::Reports)?
            .iter()
            .map(metric_column),
    );

    columns.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

    tracing::info!("|--Getting residuals...");
    columns.extend(
        sim.metric_series(MetricCategory::Residuals)?
            .into_iter()
            .map(|s| s.name),
    );

    Ok(RowSchema::new(columns))
}

/// `Drag Coefficient Monitor` in `none` becomes `Drag Coefficient[none]`.
fn metric_column(series: &MetricSeries) -> String {
    format!("{}[{}]", series.name.replace("Monitor", "").trim(), series.unit)
}

/// Strip characters that would break the header into extra fields.
fn column_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, ',' | '\r' | '\n'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Make free text safe for a single field: `,` becomes `/` and line breaks are
/// dropped.
pub fn sanitize_field(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '\r' | '\n'))
        .map(|c| if c == ',' { '/' } else { c })
        .collect()
}

/// Normalise an engine error message: each run of line breaks becomes a
/// single space and surrounding whitespace is trimmed.
pub fn sanitize_message(message: &str) -> String {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a log line back into trimmed fields.
pub fn parse_line(line: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(',')
        .map(|field| field.trim().to_string())
        .collect()
}

/// One serialised run: data cells plus the trailing error and comment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    cells: Vec<Option<String>>,
    error: String,
    comment: String,
}

impl ResultRow {
    pub fn new(cells: Vec<Option<String>>, error: &str, comment: &str) -> Self {
        Self {
            cells,
            error: sanitize_field(error),
            comment: sanitize_field(comment),
        }
    }

    /// Build the row for `outcome`.
    ///
    /// Successful runs are written positionally from their metrics. Failed runs
    /// fill parameter columns by name from the outcome's snapshot, falling back
    /// to the requested values, and leave every other data column blank.
    pub fn from_outcome(
        schema: &RowSchema,
        requested: &ParameterSet,
        outcome: &RunOutcome,
        comment: &str,
    ) -> Self {
        let cells = match outcome {
            RunOutcome::Success(metrics) => {
                let cells = metrics.cells();
                if cells.len() != schema.data_columns().len() {
                    tracing::warn!(
                        expected = schema.data_columns().len(),
                        actual = cells.len(),
                        "Result set no longer matches the log header, appending positionally"
                    );
                }
                cells.into_iter().map(Some).collect()
            }
            RunOutcome::Failure { parameters, .. } => schema
                .data_columns()
                .iter()
                .map(|column| {
                    parameters
                        .iter()
                        .find(|p| p.name == *column)
                        .map(|p| p.value)
                        .or_else(|| requested.value(column))
                        .map(format_value)
                })
                .collect(),
        };
        Self::new(cells, outcome.error_text(), comment)
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }

    pub fn error(&self) -> &str {
        &self.error
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn to_line(&self) -> String {
        self.cells
            .iter()
            .map(|cell| cell.as_deref().unwrap_or(""))
            .chain([self.error.as_str(), self.comment.as_str()])
            .collect::<Vec<_>>()
            .join(DELIMITER)
    }
}

/// Handle to an initialised results log.
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
    schema: RowSchema,
    /// Why the log could not be initialised; such a handle never writes
    detached: Option<String>,
}

impl ResultLog {
    /// Open the log at `path`, creating it with `schema`'s header if absent.
    ///
    /// An existing file is never modified: its header is read back and becomes
    /// the frozen schema, whatever `schema` says.
    pub fn ensure_initialized(path: &Path, schema: RowSchema) -> Result<Self, LogWriteError> {
        if let Some(existing) = Self::open(path)? {
            if existing.schema != schema {
                tracing::warn!(
                    path = %path.display(),
                    "Existing results log header differs from the current simulation"
                );
            }
            return Ok(existing);
        }

        let create_err = |source| LogWriteError::Create {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(create_err)?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(create_err)?;
        tracing::info!("File created at {}", path.display());

        let header = schema.header_line();
        writeln!(file, "{header}").map_err(create_err)?;
        file.flush().map_err(create_err)?;
        tracing::info!("Header written: {header}");

        Ok(Self {
            path: path.to_path_buf(),
            schema,
            detached: None,
        })
    }

    /// Open an existing log, reading its frozen header. `None` if the file is
    /// absent or empty.
    pub fn open(path: &Path) -> Result<Option<Self>, LogWriteError> {
        if !path.exists() {
            return Ok(None);
        }

        let read_err = |source| LogWriteError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = fs::File::open(path).map_err(read_err)?;
        let mut header = String::new();
        let read = BufReader::new(file)
            .read_line(&mut header)
            .map_err(read_err)?;
        if read == 0 {
            return Ok(None);
        }
        if header.trim().is_empty() {
            return Err(LogWriteError::MissingHeader {
                path: path.to_path_buf(),
            });
        }

        Ok(Some(Self {
            path: path.to_path_buf(),
            schema: RowSchema::from_header(&header),
            detached: None,
        }))
    }

    /// A handle for a log that could not be initialised. Every append is
    /// reported with `reason` and dropped; the file is never touched.
    pub fn detached(path: &Path, schema: RowSchema, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            schema,
            detached: Some(reason.into()),
        }
    }

    pub fn is_detached(&self) -> bool {
        self.detached.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &RowSchema {
        &self.schema
    }

    /// Append one line. Failures are logged, never returned.
    pub fn append_row(&self, row: &ResultRow) {
        let line = row.to_line();
        match self.try_append(&line) {
            Ok(()) => tracing::info!("Data written: {line}"),
            Err(e) => tracing::error!("{e}; lost row: {line}"),
        }
    }

    fn try_append(&self, line: &str) -> Result<(), LogWriteError> {
        if let Some(reason) = &self.detached {
            return Err(LogWriteError::Detached {
                path: self.path.clone(),
                reason: reason.clone(),
            });
        }
        let append_err = |source| LogWriteError::Append {
            path: self.path.clone(),
            source,
        };
        // No `create`: a missing file means the header was never written.
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(append_err)?;
        writeln!(file, "{line}").map_err(append_err)?;
        file.flush().map_err(append_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_field() {
        assert_eq!(sanitize_field("bad cell, retry\nlater"), "bad cell/ retrylater");
        assert_eq!(sanitize_field("N/A"), "N/A");
    }

    #[test]
    fn test_sanitize_message() {
        assert_eq!(
            sanitize_message("Volume mesh failed\r\n  at surface 12\n\n"),
            "Volume mesh failed at surface 12"
        );
        assert_eq!(sanitize_message("mesh failed"), "mesh failed");
    }

    #[test]
    fn test_metric_column_strips_monitor() {
        let series = MetricSeries::new("Drag Coefficient Monitor", "none");
        assert_eq!(metric_column(&series), "Drag Coefficient[none]");
    }

    #[test]
    fn test_schema_strips_delimiters() {
        let schema = RowSchema::new(vec!["Lift, Rear".into(), "Cell Count".into()]);
        assert_eq!(schema.data_columns(), ["Lift Rear", "Cell Count"]);
        assert_eq!(schema.header_line(), "Lift Rear, Cell Count, Error, Comment");
    }

    #[test]
    fn test_header_round_trip() {
        let schema = RowSchema::new(vec!["Back Offset".into(), "Force[N]".into()]);
        assert_eq!(RowSchema::from_header(&schema.header_line()), schema);
    }

    #[test]
    fn test_row_line_blank_cells() {
        let row = ResultRow::new(
            vec![Some("6".into()), None, Some("1".into())],
            "mesh failed",
            "N/A",
        );
        assert_eq!(row.to_line(), "6, , 1, mesh failed, N/A");
        assert_eq!(parse_line(&row.to_line()).len(), 5);
    }
}
