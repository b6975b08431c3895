//! The two form templates and the values each takes from a row

use crate::document::Document;
use crate::error::{BatchError, PdfError};
use crate::forms::{fill_document, resolve_fields, FieldValues, FillReport};
use crate::sheet::{CellError, Row};
use std::fmt;
use std::path::Path;

/// Row columns copied into the worksheet, each also under an `x` prefix
const WORKSHEET_COLUMNS: &[&str] = &[
    "number",
    "proposed-class",
    "name",
    "country",
    "date",
    "competition",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Worksheet,
    Assessment,
}

impl TemplateKind {
    /// Generation order within a row
    pub const ALL: [TemplateKind; 2] = [TemplateKind::Worksheet, TemplateKind::Assessment];

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::Worksheet => "Worksheet-Stages-2C-and-3.pdf",
            TemplateKind::Assessment => "Assessment-Form-Stages-2AB.pdf",
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            TemplateKind::Worksheet => "Worksheet-Stages-2C-and-3",
            TemplateKind::Assessment => "Assessment-Form-Stages-2AB",
        }
    }

    /// Archive folder (below the sheet folder)
    pub fn folder(&self) -> &'static str {
        match self {
            TemplateKind::Worksheet => "Stages 2C and 3",
            TemplateKind::Assessment => "Stages 2AB",
        }
    }

    /// Field values this template takes from `row`
    pub fn field_values(&self, row: &Row) -> Result<FieldValues, CellError> {
        let mut values = FieldValues::new();
        match self {
            TemplateKind::Worksheet => {
                for column in WORKSHEET_COLUMNS {
                    let value = match *column {
                        "proposed-class" => row.decimal(column)?,
                        "date" => row.date(column)?,
                        _ => row.text(column)?,
                    };
                    values.insert(format!("x{column}"), value.clone());
                    values.insert(*column, value);
                }
            }
            TemplateKind::Assessment => {
                values.insert("name", row.text("name")?);
                values.insert("country", row.text("country")?);
                values.insert("dob", row.date("dob")?);
            }
        }
        Ok(values)
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::Worksheet => write!(f, "Worksheet"),
            TemplateKind::Assessment => write!(f, "Assessment"),
        }
    }
}

/// A parsed template, read-only after loading. Documents are produced from
/// clones, so filling never touches the cached template.
#[derive(Debug)]
pub struct FormTemplate {
    kind: TemplateKind,
    document: Document,
}

impl FormTemplate {
    pub fn load(kind: TemplateKind, data: &[u8]) -> Result<Self, BatchError> {
        let document = Document::load(data).map_err(|source| BatchError::TemplateLoad {
            name: kind.file_name().to_string(),
            source,
        })?;

        match resolve_fields(&document) {
            Ok(fields) => tracing::info!("loaded {} template with {} fields", kind, fields.len()),
            Err(e) => tracing::warn!("{} template has no usable form: {}", kind, e),
        }

        Ok(Self { kind, document })
    }

    pub fn open(kind: TemplateKind, path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| BatchError::TemplateLoad {
            name: path.display().to_string(),
            source: PdfError::Io(e),
        })?;
        Self::load(kind, &data)
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    /// Independent copy of the template document
    pub fn instantiate(&self) -> Document {
        self.document.clone()
    }

    /// Fully-qualified names of the template's fields
    pub fn field_names(&self) -> Vec<String> {
        resolve_fields(&self.document)
            .map(|fields| fields.names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Fill a fresh copy and serialize it
    pub fn render(&self, values: &FieldValues) -> Result<(Vec<u8>, FillReport), PdfError> {
        let mut document = self.instantiate();
        let report = fill_document(&mut document, values)?;
        let bytes = document.save_to_bytes()?;
        Ok((bytes, report))
    }
}

/// The worksheet and assessment templates
#[derive(Debug)]
pub struct TemplateSet {
    worksheet: FormTemplate,
    assessment: FormTemplate,
}

impl TemplateSet {
    pub fn new(worksheet: FormTemplate, assessment: FormTemplate) -> Self {
        Self {
            worksheet,
            assessment,
        }
    }

    /// Load both templates by their well-known file names from `dir`
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Self, BatchError> {
        let dir = dir.as_ref();
        Ok(Self::new(
            FormTemplate::open(
                TemplateKind::Worksheet,
                dir.join(TemplateKind::Worksheet.file_name()),
            )?,
            FormTemplate::open(
                TemplateKind::Assessment,
                dir.join(TemplateKind::Assessment.file_name()),
            )?,
        ))
    }

    pub fn get(&self, kind: TemplateKind) -> &FormTemplate {
        match kind {
            TemplateKind::Worksheet => &self.worksheet,
            TemplateKind::Assessment => &self.assessment,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormTemplate> {
        TemplateKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}
