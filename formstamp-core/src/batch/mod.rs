//! Spreadsheet-to-archive batch generation
//!
//! Every data row of every sheet yields two documents, one per template.
//! Rows are processed in order; a row that fails is recorded and the batch
//! moves on, so one bad row never costs the rest of the archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use formstamp::batch::{BatchOptions, FormBatch, TemplateSet};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let templates = TemplateSet::load_from_dir("templates")?;
//! let options = BatchOptions::default().with_progress_callback(|info| {
//!     println!("{}", info.format_progress());
//! });
//!
//! let mut batch = FormBatch::new(templates, options);
//! let report = batch.run_bytes(&std::fs::read("Players.xlsx")?)?;
//!
//! std::fs::write("Generated_Forms.zip", &report.archive)?;
//! println!("{}", report.summary.format_report(5));
//! # Ok(())
//! # }
//! ```

use crate::error::BatchError;
use crate::sheet::{Row, Sheet, Workbook};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Instant;

pub mod archive;
pub mod progress;
pub mod result;
pub mod template;

pub use archive::OutputArchive;
pub use progress::{BatchProgress, ProgressBar, ProgressCallback, ProgressInfo};
pub use result::{BatchReport, BatchSummary, RowError, RowResult, RowWarning};
pub use template::{FormTemplate, TemplateKind, TemplateSet};

/// Progress units per data row, one per template
pub const UNITS_PER_ROW: usize = 2;

/// Options for batch generation
#[derive(Clone)]
pub struct BatchOptions {
    /// Progress callback
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Checked before each row; once set no new row starts
    pub cancel_flag: Arc<AtomicBool>,
    /// Failure messages kept in the summary preview
    pub preview_limit: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            progress_callback: None,
            cancel_flag: Arc::new(AtomicBool::new(false)),
            preview_limit: 5,
        }
    }
}

impl BatchOptions {
    /// Set progress callback
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ProgressInfo) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    LoadingSpreadsheet,
    ValidatingSheet,
    ProcessingRow,
    Archiving,
    Done,
    /// Bad workbook or missing columns; no archive is produced
    Failed,
}

/// Runs the two templates over a workbook
pub struct FormBatch {
    templates: TemplateSet,
    options: BatchOptions,
    state: BatchState,
}

impl FormBatch {
    pub fn new(templates: TemplateSet, options: BatchOptions) -> Self {
        Self {
            templates,
            options,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn templates(&self) -> &TemplateSet {
        &self.templates
    }

    /// Stop before the next row
    pub fn cancel(&self) {
        self.options.cancel_flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.options.cancel_flag.load(Ordering::SeqCst)
    }

    /// Read a workbook from raw spreadsheet bytes and run it
    pub fn run_bytes(&mut self, data: &[u8]) -> Result<BatchReport, BatchError> {
        self.set_state(BatchState::LoadingSpreadsheet);
        let workbook = match Workbook::from_bytes(data) {
            Ok(workbook) => workbook,
            Err(e) => {
                self.set_state(BatchState::Failed);
                return Err(e);
            }
        };
        self.run(&workbook)
    }

    /// Generate documents for every row of `workbook`.
    ///
    /// Fails only when a sheet lacks required columns (checked for every
    /// sheet before any row is processed) or the archive cannot be
    /// finalized. Row failures are reported in the summary.
    pub fn run(&mut self, workbook: &Workbook) -> Result<BatchReport, BatchError> {
        let start_time = Instant::now();

        self.set_state(BatchState::ValidatingSheet);
        for sheet in workbook.sheets() {
            let missing = sheet.missing_columns();
            if !missing.is_empty() {
                self.set_state(BatchState::Failed);
                return Err(BatchError::Schema {
                    sheet: sheet.name.clone(),
                    missing,
                });
            }
        }

        let total_rows = workbook.total_rows();
        let progress = BatchProgress::new(total_rows * UNITS_PER_ROW);
        let mut archive = OutputArchive::new();
        let mut summary = BatchSummary {
            total_rows,
            total_units: progress.total_units(),
            ..Default::default()
        };
        tracing::info!(
            "generating forms for {} rows in {} sheets",
            total_rows,
            workbook.sheets().len()
        );

        'sheets: for sheet in workbook.sheets() {
            for row in sheet.rows() {
                if self.is_cancelled() {
                    tracing::warn!("batch cancelled before row {} of '{}'", row.number, sheet.name);
                    summary.cancelled = true;
                    break 'sheets;
                }
                self.set_state(BatchState::ProcessingRow);

                let result = self.process_row(sheet, row, &progress, &mut archive, &mut summary);
                if let Some(message) = result.message() {
                    summary.failures.push(message.to_string());
                }
                match &result {
                    RowResult::Generated { entries, .. } => {
                        summary.generated_documents += entries.len()
                    }
                    RowResult::Failed { .. } => summary.failed_documents += UNITS_PER_ROW,
                    RowResult::Skipped { .. } => {}
                }
                summary.rows.push(result);
            }
        }

        self.set_state(BatchState::Archiving);
        let archive = archive.finish()?;

        summary.completed_units = progress.completed_units();
        summary.duration_secs = start_time.elapsed().as_secs_f64();
        summary.finalize(self.options.preview_limit);
        self.set_state(BatchState::Done);

        tracing::info!(
            "generated {} documents, {} problem rows in {:.2}s",
            summary.generated_documents,
            summary.failures.len(),
            summary.duration_secs
        );
        Ok(BatchReport { summary, archive })
    }

    fn process_row(
        &self,
        sheet: &Sheet,
        row: &Row,
        progress: &BatchProgress,
        archive: &mut OutputArchive,
        summary: &mut BatchSummary,
    ) -> RowResult {
        let name = row.get("name").render().unwrap_or_default();

        if row.is_blank("name") || row.is_blank("number") {
            let message = format!(
                "Skipping row {} (name: '{}') in sheet '{}' due to missing 'name' or 'number'.",
                row.number, name, sheet.name
            );
            tracing::warn!("{}", message);
            progress.advance(UNITS_PER_ROW);
            self.notify(progress, format!("Skipped: {name}"));
            return RowResult::Skipped {
                sheet: sheet.name.clone(),
                row: row.number,
                name,
                message,
            };
        }

        let mut units = 0;
        let outcome = self.write_row(sheet, row, &name, archive, summary, || {
            units += 1;
            progress.advance(1);
            self.notify(progress, format!("Processing: {name}"));
        });

        match outcome {
            Ok(entries) => RowResult::Generated {
                sheet: sheet.name.clone(),
                row: row.number,
                name,
                entries,
            },
            Err(e) => {
                self.settle_failed_row(
                    progress,
                    units,
                    format!("Error with {name} (Sheet: {}). Continuing...", sheet.name),
                );
                let message = format!(
                    "Error processing '{}' (row {}) from sheet '{}': {}",
                    name, row.number, sheet.name, e
                );
                tracing::warn!("{}", message);
                RowResult::Failed {
                    sheet: sheet.name.clone(),
                    row: row.number,
                    name,
                    message,
                }
            }
        }
    }

    /// Render both documents, then write them; nothing is written unless
    /// both rendered
    fn write_row(
        &self,
        sheet: &Sheet,
        row: &Row,
        name: &str,
        archive: &mut OutputArchive,
        summary: &mut BatchSummary,
        mut on_document: impl FnMut(),
    ) -> Result<Vec<String>, RowError> {
        let mut rendered = Vec::with_capacity(UNITS_PER_ROW);
        for template in self.templates.iter() {
            let kind = template.kind();
            let values = kind.field_values(row)?;
            let (bytes, report) = template.render(&values)?;
            summary
                .warnings
                .extend(report.warnings.into_iter().map(|field| RowWarning {
                    sheet: sheet.name.clone(),
                    row: row.number,
                    template: kind.to_string(),
                    field,
                }));
            rendered.push((archive.entry_path(&sheet.name, kind, name, row.number), bytes));
            on_document();
        }

        let mut entries = Vec::with_capacity(rendered.len());
        for (path, bytes) in rendered {
            archive.add(path.clone(), &bytes)?;
            entries.push(path);
        }
        Ok(entries)
    }

    /// Account for the units a failed row did not reach. Rows that failed
    /// after both documents were counted report nothing further.
    fn settle_failed_row(&self, progress: &BatchProgress, units_done: usize, label: String) {
        let remaining = UNITS_PER_ROW.saturating_sub(units_done);
        if remaining > 0 {
            progress.advance(remaining);
            self.notify(progress, label);
        }
    }

    fn notify(&self, progress: &BatchProgress, label: String) {
        if let Some(callback) = &self.options.progress_callback {
            callback.on_progress(&progress.get_info(label));
        }
    }

    fn set_state(&mut self, state: BatchState) {
        if self.state != state {
            tracing::debug!("batch state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }
}
