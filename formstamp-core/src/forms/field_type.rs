//! Form field types according to ISO 32000-1 Section 12.7.4

/// Type of form field, from the (inheritable) `/FT` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Button field (push button, checkbox, radio button)
    Button,
    /// Text field
    Text,
    /// Choice field (list box, combo box)
    Choice,
    /// Signature field
    Signature,
}

impl FieldType {
    /// Get the PDF field type name
    pub fn pdf_name(&self) -> &'static str {
        match self {
            FieldType::Button => "Btn",
            FieldType::Text => "Tx",
            FieldType::Choice => "Ch",
            FieldType::Signature => "Sig",
        }
    }

    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "Btn" => Some(FieldType::Button),
            "Tx" => Some(FieldType::Text),
            "Ch" => Some(FieldType::Choice),
            "Sig" => Some(FieldType::Signature),
            _ => None,
        }
    }
}
