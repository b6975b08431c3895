use crate::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Invalid PDF structure: {0}")]
    InvalidStructure(String),

    #[error("Document has no interactive form")]
    NoForm,

    #[error("Invalid object reference: {0} {1} R")]
    InvalidObjectReference(u32, u16),

    #[error("Encrypted documents are not supported")]
    Encrypted,

    #[error("Compression error: {0}")]
    CompressionError(String),
}

pub type Result<T> = std::result::Result<T, PdfError>;

/// Errors that stop a batch before or instead of producing an archive.
///
/// Failures of individual rows never surface here; they are recorded in the
/// batch summary as [`crate::batch::RowError`] messages.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to load template '{name}': {source}")]
    TemplateLoad {
        name: String,
        #[source]
        source: PdfError,
    },

    #[error("Failed to read workbook: {0}")]
    WorkbookLoad(String),

    #[error("Sheet '{sheet}' is missing required columns: {}", missing.join(", "))]
    Schema { sheet: String, missing: Vec<String> },

    #[error("Failed to finalize archive: {0}")]
    Archive(String),
}

impl BatchError {
    /// True for errors raised while loading inputs, before any row is read.
    pub fn is_fatal_load(&self) -> bool {
        matches!(self, BatchError::TemplateLoad { .. } | BatchError::WorkbookLoad(_))
    }
}
