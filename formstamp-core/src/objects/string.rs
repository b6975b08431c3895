use crate::forms::text;
use std::fmt;

/// Raw bytes of a PDF string object.
///
/// PDF strings are byte sequences; text strings are interpreted as
/// PDFDocEncoding or UTF-16BE (with BOM) through [`PdfString::to_text`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PdfString(Vec<u8>);

impl PdfString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_text(value: &str) -> Self {
        Self(text::encode_text_string(value))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the bytes as a PDF text string.
    pub fn to_text(&self) -> String {
        text::decode_text_string(&self.0)
    }
}

impl From<&[u8]> for PdfString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for PdfString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_text_is_stored_verbatim() {
        let s = PdfString::from_text("Team A");
        assert_eq!(s.as_bytes(), b"Team A");
        assert_eq!(s.to_text(), "Team A");
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn test_non_latin_text_uses_utf16() {
        let s = PdfString::from_text("Иван");
        assert_eq!(&s.as_bytes()[..2], &[0xFE, 0xFF]);
        assert_eq!(s.to_string(), "Иван");
    }

    #[test]
    fn test_raw_bytes() {
        let s = PdfString::from(&b"\x00\x01"[..]);
        assert_eq!(s.clone().into_bytes(), vec![0, 1]);
        assert!(!s.is_empty());
        assert!(PdfString::default().is_empty());
    }
}
