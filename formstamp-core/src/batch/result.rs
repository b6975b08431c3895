//! Per-row results and the batch summary

use crate::error::PdfError;
use crate::forms::FieldWarning;
use crate::sheet::CellError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Why a single row produced no documents. Never escapes the batch.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("{0}")]
    Pdf(#[from] PdfError),

    #[error("{0}")]
    Cell(#[from] CellError),

    #[error("archive write failed: {0}")]
    Archive(String),
}

/// What happened to one data row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowResult {
    /// Both documents were written
    Generated {
        sheet: String,
        row: u32,
        name: String,
        entries: Vec<String>,
    },

    /// `name` or `number` was blank
    Skipped {
        sheet: String,
        row: u32,
        name: String,
        message: String,
    },

    /// Filling or writing failed; nothing was written for the row
    Failed {
        sheet: String,
        row: u32,
        name: String,
        message: String,
    },
}

impl RowResult {
    pub fn is_generated(&self) -> bool {
        matches!(self, RowResult::Generated { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, RowResult::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RowResult::Failed { .. })
    }

    pub fn row(&self) -> u32 {
        match self {
            RowResult::Generated { row, .. }
            | RowResult::Skipped { row, .. }
            | RowResult::Failed { row, .. } => *row,
        }
    }

    /// Message recorded in the failure list, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            RowResult::Skipped { message, .. } | RowResult::Failed { message, .. } => {
                Some(message)
            }
            RowResult::Generated { .. } => None,
        }
    }
}

impl fmt::Display for RowResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowResult::Generated {
                sheet,
                row,
                name,
                entries,
            } => write!(
                f,
                "✓ {sheet} row {row} ({name}) - {} documents",
                entries.len()
            ),
            RowResult::Skipped { message, .. } => write!(f, "⚠ {message}"),
            RowResult::Failed { message, .. } => write!(f, "✗ {message}"),
        }
    }
}

/// A value one template of a row could not take
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowWarning {
    pub sheet: String,
    pub row: u32,
    pub template: String,
    #[serde(flatten)]
    pub field: FieldWarning,
}

impl fmt::Display for RowWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} row {} ({}): {}",
            self.sheet, self.row, self.template, self.field
        )
    }
}

/// Summary of a finished (or cancelled) batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// No problem rows and not cancelled
    pub success: bool,
    /// Skipped plus failed rows
    pub problem_rows: usize,
    /// Leading messages of `failures`, capped by the preview limit
    pub failure_preview: Vec<String>,
    /// Messages left out of `failure_preview`
    pub more_failures: usize,
    /// Data rows across all sheets
    pub total_rows: usize,
    /// `2 × total_rows`
    pub total_units: usize,
    pub completed_units: usize,
    pub generated_documents: usize,
    pub failed_documents: usize,
    /// Skip and failure messages, in row order
    #[serde(skip)]
    pub failures: Vec<String>,
    /// Field-level warnings (unknown field names, unsupported kinds)
    pub warnings: Vec<RowWarning>,
    pub cancelled: bool,
    /// Wall-clock duration in seconds
    pub duration_secs: f64,
    pub rows: Vec<RowResult>,
}

impl BatchSummary {
    pub fn skipped_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_skipped()).count()
    }

    pub fn failed_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_failed()).count()
    }

    /// Archive entry names in the order they were written
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| match row {
                RowResult::Generated { entries, .. } => entries.as_slice(),
                _ => &[],
            })
            .map(String::as_str)
    }

    /// True when every row was generated and the batch ran to the end
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    /// Fill in the reported fields from the row results
    pub fn finalize(&mut self, preview_limit: usize) {
        self.success = self.is_success();
        self.problem_rows = self.skipped_rows() + self.failed_rows();
        let (shown, more) = self.preview(preview_limit);
        let shown = shown.to_vec();
        self.failure_preview = shown;
        self.more_failures = more;
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs.max(0.0))
    }

    /// The first `limit` failure messages and how many more there are
    pub fn preview(&self, limit: usize) -> (&[String], usize) {
        let shown = self.failures.len().min(limit);
        (&self.failures[..shown], self.failures.len() - shown)
    }

    /// Format summary as a report, listing at most `limit` failures
    pub fn format_report(&self, limit: usize) -> String {
        let mut report = String::new();

        report.push_str(&format!(
            "Form Generation Summary\n\
             =======================\n\
             Rows: {}\n\
             Generated PDFs: {}/{}\n\
             Skipped rows: {}\n\
             Failed rows: {}\n\
             Duration: {:.2}s\n",
            self.total_rows,
            self.generated_documents,
            self.total_units,
            self.skipped_rows(),
            self.failed_rows(),
            self.duration_secs
        ));

        if self.cancelled {
            report.push_str("\n⚠️  Batch was cancelled\n");
        }

        let (shown, more) = self.preview(limit);
        if !shown.is_empty() {
            report.push_str("\nProblems:\n");
            for message in shown {
                report.push_str(&format!("  - {message}\n"));
            }
            if more > 0 {
                report.push_str(&format!("  ... and {more} more\n"));
            }
        }

        if !self.warnings.is_empty() {
            report.push_str(&format!("\nField warnings: {}\n", self.warnings.len()));
        }

        report
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_report(usize::MAX))
    }
}

/// Summary plus the finished zip archive
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub archive: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(row: u32) -> RowResult {
        RowResult::Failed {
            sheet: "Team A".to_string(),
            row,
            name: "Jane".to_string(),
            message: format!("Error processing 'Jane' (row {row}) from sheet 'Team A': boom"),
        }
    }

    fn summary_with(rows: Vec<RowResult>) -> BatchSummary {
        BatchSummary {
            total_rows: rows.len(),
            total_units: rows.len() * 2,
            completed_units: rows.len() * 2,
            failures: rows
                .iter()
                .filter_map(|r| r.message().map(str::to_string))
                .collect(),
            rows,
            ..Default::default()
        }
    }

    #[test]
    fn test_row_result_accessors() {
        let generated = RowResult::Generated {
            sheet: "Team A".to_string(),
            row: 2,
            name: "Jane Doe".to_string(),
            entries: vec!["a.pdf".to_string(), "b.pdf".to_string()],
        };
        assert!(generated.is_generated());
        assert_eq!(generated.message(), None);
        assert_eq!(generated.to_string(), "✓ Team A row 2 (Jane Doe) - 2 documents");

        let failure = failed(3);
        assert!(failure.is_failed());
        assert_eq!(failure.row(), 3);
        assert!(failure.to_string().starts_with("✗ Error processing"));
    }

    #[test]
    fn test_preview_caps_failures() {
        let summary = summary_with((2..9).map(failed).collect());
        let (shown, more) = summary.preview(5);
        assert_eq!(shown.len(), 5);
        assert_eq!(more, 2);
        assert!(!summary.is_success());

        let report = summary.format_report(5);
        assert!(report.contains("Failed rows: 7"));
        assert!(report.contains("... and 2 more"));
    }

    #[test]
    fn test_empty_summary_is_success() {
        let summary = BatchSummary::default();
        assert!(summary.is_success());
        assert_eq!(summary.preview(5), (&[][..], 0));
        assert_eq!(summary.entries().count(), 0);
    }

    #[test]
    fn test_cancelled_is_not_success() {
        let summary = BatchSummary {
            cancelled: true,
            ..Default::default()
        };
        assert!(!summary.is_success());
        assert!(summary.format_report(5).contains("cancelled"));
    }

    #[test]
    fn test_summary_json_carries_capped_preview() {
        let mut summary = summary_with((2..9).map(failed).collect());
        summary.warnings.push(RowWarning {
            sheet: "Team A".to_string(),
            row: 2,
            template: "Worksheet".to_string(),
            field: FieldWarning {
                field: "xname".to_string(),
                outcome: "not found",
            },
        });
        summary.finalize(2);

        let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["problem_rows"], 7);
        assert_eq!(json["failure_preview"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["failure_preview"][0],
            "Error processing 'Jane' (row 2) from sheet 'Team A': boom"
        );
        assert_eq!(json["more_failures"], 5);
        assert!(json.get("failures").is_none());
        assert_eq!(json["rows"][0]["status"], "failed");
        assert_eq!(json["warnings"][0]["field"], "xname");
        assert_eq!(json["warnings"][0]["outcome"], "not found");
        assert_eq!(json["warnings"][0]["template"], "Worksheet");
    }

    #[test]
    fn test_finalize_clean_run() {
        let mut summary = BatchSummary::default();
        summary.finalize(5);
        assert!(summary.success);
        assert_eq!(summary.problem_rows, 0);
        assert!(summary.failure_preview.is_empty());
        assert_eq!(summary.more_failures, 0);
    }

    #[test]
    fn test_row_warning_display() {
        let warning = RowWarning {
            sheet: "Team A".to_string(),
            row: 4,
            template: "Assessment".to_string(),
            field: FieldWarning {
                field: "dob".to_string(),
                outcome: "unsupported field kind",
            },
        };
        assert_eq!(
            warning.to_string(),
            "Team A row 4 (Assessment): field 'dob': unsupported field kind"
        );
    }

    #[test]
    fn test_row_error_display() {
        let error = RowError::from(PdfError::NoForm);
        assert_eq!(error.to_string(), "Document has no interactive form");
    }
}
