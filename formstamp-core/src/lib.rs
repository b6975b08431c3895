//! # formstamp
//!
//! Batch population of PDF form templates from spreadsheet rows.
//!
//! ## Features
//!
//! - **PDF Loading**: classic and stream cross-reference tables, object streams,
//!   Flate/ASCIIHex/ASCII85 filters and scan-based recovery of damaged files
//! - **Form Filling**: resolves AcroForm fields by fully-qualified name and writes
//!   text values while keeping every other field interactive
//! - **PDF Writing**: serializes the edited object graph with a fresh xref table
//! - **Spreadsheet Intake**: reads `.xlsx`, `.xls` and `.ods` workbooks
//! - **Batch Generation**: two documents per row, per-row error isolation,
//!   progress reporting and a single zip archive as output
//!
//! ## Quick Start
//!
//! ### Filling one document
//!
//! ```rust,no_run
//! use formstamp::{fill_document, Document, FieldValues, Result};
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::load_file("Assessment-Form-Stages-2AB.pdf")?;
//!
//! let values: FieldValues = [("name", "Jane Doe"), ("dob", "05-10-1995")]
//!     .into_iter()
//!     .collect();
//! let report = fill_document(&mut doc, &values)?;
//! println!("filled {} fields", report.applied.len());
//!
//! doc.save("filled.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Listing fields
//!
//! ```rust,no_run
//! use formstamp::{resolve_fields, Document};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Document::load_file("Worksheet-Stages-2C-and-3.pdf")?;
//! for field in resolve_fields(&doc)?.iter() {
//!     println!("{field}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod document;
pub mod error;
pub mod forms;
pub mod objects;
pub mod parser;
pub mod sheet;
pub mod writer;

pub use batch::{BatchOptions, BatchReport, BatchSummary, FormBatch, TemplateKind, TemplateSet};
pub use document::Document;
pub use error::{BatchError, PdfError, Result};
pub use forms::{
    apply, fill_document, resolve_fields, FieldHandle, FieldMap, FieldOutcome, FieldValues,
    FillReport,
};
pub use objects::{Dictionary, Object, ObjectId, PdfString, Stream};
pub use sheet::{CellValue, Row, Sheet, Workbook, REQUIRED_COLUMNS};
pub use writer::PdfWriter;

/// Current version of formstamp
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_empty_document() {
        let doc = Document::new();
        assert_eq!(doc.object_count(), 0);
        assert!(doc.catalog().is_err());
    }

    #[test]
    fn test_version_info() {
        assert!(!VERSION.is_empty());
    }
}
