//! Spreadsheet cell values and how they render into form text

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

/// Text layouts accepted for dates typed into cells, tried in order
const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y-%m-%d", "%Y/%m/%d"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Output layout of rendered dates
const OUTPUT_DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    /// Spreadsheet error code such as `#REF!`
    Error(String),
}

/// A cell whose content cannot be turned into field text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellError {
    pub column: String,
    pub code: String,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cell '{}' holds error {}", self.column, self.code)
    }
}

impl std::error::Error for CellError {}

impl CellValue {
    /// Empty, or text made only of whitespace
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Field text for the cell; integral numbers drop their fractional part
    pub fn render(&self) -> Option<String> {
        let text = match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.clone(),
            CellValue::Int(value) => value.to_string(),
            CellValue::Float(value) => format_float(*value),
            CellValue::Bool(true) => "True".to_string(),
            CellValue::Bool(false) => "False".to_string(),
            CellValue::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            CellValue::Error(_) => return None,
        };
        Some(text)
    }

    /// Like [`render`](Self::render), but numbers keep at least one decimal
    /// (`1` becomes `1.0`)
    pub fn render_decimal(&self) -> Option<String> {
        match self {
            CellValue::Int(value) => Some(format!("{value}.0")),
            CellValue::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(format!("{value:.1}"))
            }
            other => other.render(),
        }
    }

    /// Render as `DD-MM-YYYY` when the cell holds something date-like,
    /// otherwise fall back to the plain rendering
    pub fn render_date(&self) -> Option<String> {
        let date = match self {
            CellValue::DateTime(value) => Some(*value),
            CellValue::Int(serial) => from_excel_serial(*serial as f64),
            CellValue::Float(serial) => from_excel_serial(*serial),
            CellValue::Text(text) => parse_date_text(text.trim()),
            _ => None,
        };
        match date {
            Some(date) => Some(date.format(OUTPUT_DATE_FORMAT).to_string()),
            None => self.render(),
        }
    }

    pub fn error_code(&self) -> Option<&str> {
        match self {
            CellValue::Error(code) => Some(code),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Excel serial day numbers count from 1899-12-30
fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    epoch.checked_add_signed(Duration::seconds(seconds))
}

fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_blank() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::from("  \t").is_blank());
        assert!(!CellValue::from("Jane").is_blank());
        assert!(!CellValue::Int(0).is_blank());
    }

    #[test]
    fn test_render_numbers() {
        assert_eq!(CellValue::Int(4).render().unwrap(), "4");
        assert_eq!(CellValue::Float(4.0).render().unwrap(), "4");
        assert_eq!(CellValue::Float(2.5).render().unwrap(), "2.5");
        assert_eq!(CellValue::Bool(true).render().unwrap(), "True");
        assert_eq!(CellValue::Empty.render().unwrap(), "");
        assert_eq!(CellValue::Error("#REF!".into()).render(), None);
    }

    #[test]
    fn test_render_decimal() {
        assert_eq!(CellValue::Int(1).render_decimal().unwrap(), "1.0");
        assert_eq!(CellValue::Float(3.0).render_decimal().unwrap(), "3.0");
        assert_eq!(CellValue::Float(2.5).render_decimal().unwrap(), "2.5");
        assert_eq!(CellValue::from("4.5").render_decimal().unwrap(), "4.5");
    }

    #[test]
    fn test_render_date_from_cells() {
        let cell = CellValue::DateTime(datetime(2024, 2, 1));
        assert_eq!(cell.render_date().unwrap(), "01-02-2024");

        // 45323 is 2024-02-01
        assert_eq!(CellValue::Int(45323).render_date().unwrap(), "01-02-2024");
        assert_eq!(CellValue::Float(45323.5).render_date().unwrap(), "01-02-2024");
    }

    #[test]
    fn test_render_date_from_text() {
        for text in ["01/02/2024", "01-02-2024", "01.02.2024", "2024-02-01", "2024-02-01 00:00:00"] {
            assert_eq!(CellValue::from(text).render_date().unwrap(), "01-02-2024", "{text}");
        }
    }

    #[test]
    fn test_unparseable_date_passes_through() {
        assert_eq!(CellValue::from("sometime").render_date().unwrap(), "sometime");
        assert_eq!(CellValue::Empty.render_date().unwrap(), "");
        assert_eq!(CellValue::Error("#N/A".into()).render_date(), None);
    }
}
