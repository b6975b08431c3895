//! Spreadsheet intake
//!
//! A [`Workbook`] is an owned, read-only copy of every sheet of an uploaded
//! spreadsheet. The first row of each sheet holds column names; every later
//! row that is not entirely empty becomes a [`Row`].

mod cell;

pub use cell::{CellError, CellValue};

use crate::error::BatchError;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use std::collections::HashMap;
use std::io::Cursor;

/// Columns every sheet must provide
pub const REQUIRED_COLUMNS: &[&str] = &[
    "number",
    "proposed-class",
    "name",
    "country",
    "date",
    "competition",
    "dob",
];

static EMPTY: CellValue = CellValue::Empty;

/// One data row
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Row number as shown by a spreadsheet application (header is row 1)
    pub number: u32,
    cells: HashMap<String, CellValue>,
}

impl Row {
    /// Cell in `column`; missing columns read as empty
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    pub fn is_blank(&self, column: &str) -> bool {
        self.get(column).is_blank()
    }

    pub fn text(&self, column: &str) -> Result<String, CellError> {
        let cell = self.get(column);
        cell.render().ok_or_else(|| self.cell_error(column, cell))
    }

    pub fn decimal(&self, column: &str) -> Result<String, CellError> {
        let cell = self.get(column);
        cell.render_decimal().ok_or_else(|| self.cell_error(column, cell))
    }

    pub fn date(&self, column: &str) -> Result<String, CellError> {
        let cell = self.get(column);
        cell.render_date().ok_or_else(|| self.cell_error(column, cell))
    }

    fn cell_error(&self, column: &str, cell: &CellValue) -> CellError {
        CellError {
            column: column.to_string(),
            code: cell.error_code().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    next_row: u32,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
            next_row: 2,
        }
    }

    /// Append the next spreadsheet row; cells pair with columns by position.
    /// Entirely empty rows advance the row counter but are not stored.
    pub fn push_row(&mut self, cells: Vec<CellValue>) {
        let number = self.next_row;
        self.next_row += 1;
        if cells.iter().all(|cell| *cell == CellValue::Empty) {
            return;
        }

        let cells = self
            .columns
            .iter()
            .cloned()
            .zip(cells)
            .filter(|(column, _)| !column.is_empty())
            .collect();
        self.rows.push(Row { number, cells });
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Required columns absent from the header, in canonical order
    pub fn missing_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|required| !self.columns.iter().any(|column| column == *required))
            .map(|required| required.to_string())
            .collect()
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let columns = rows
            .next()
            .map(|header| {
                header
                    .iter()
                    .map(|cell| convert(cell).render().unwrap_or_default().trim().to_string())
                    .collect()
            })
            .unwrap_or_default();

        let mut sheet = Sheet::new(name, columns);
        for row in rows {
            sheet.push_row(row.iter().map(convert).collect());
        }
        sheet
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Read every sheet of an `.xlsx`, `.xlsm`, `.xls` or `.ods` file
    pub fn from_bytes(data: &[u8]) -> Result<Self, BatchError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))
            .map_err(|e| BatchError::WorkbookLoad(e.to_string()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| BatchError::WorkbookLoad(format!("sheet '{name}': {e}")))?;
            let sheet = Sheet::from_range(&name, &range);
            tracing::debug!("sheet '{}': {} data rows", name, sheet.rows.len());
            sheets.push(sheet);
        }

        tracing::info!("read workbook with {} sheets", sheets.len());
        Ok(Self { sheets })
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.rows.len()).sum()
    }
}

fn convert(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Int(value) => CellValue::Int(*value),
        Data::Float(value) => CellValue::Float(*value),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(value) => CellValue::DateTime(value),
            None => CellValue::Text(cell.to_string()),
        },
        Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(error) => CellValue::Error(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_row_numbers_skip_empty_rows() {
        let mut sheet = Sheet::new("Team A", vec!["name".to_string(), "number".to_string()]);
        sheet.push_row(vec!["Jane".into(), CellValue::Int(4)]);
        sheet.push_row(vec![CellValue::Empty, CellValue::Empty]);
        sheet.push_row(vec!["John".into(), CellValue::Int(7)]);

        let numbers: Vec<u32> = sheet.rows().iter().map(|row| row.number).collect();
        assert_eq!(numbers, vec![2, 4]);
        assert_eq!(sheet.rows()[1].text("number").unwrap(), "7");
    }

    #[test]
    fn test_missing_columns() {
        let sheet = Sheet::new("Team A", vec!["name".to_string(), "dob".to_string()]);
        assert_eq!(
            sheet.missing_columns(),
            vec!["number", "proposed-class", "country", "date", "competition"]
        );
        assert!(Sheet::new("ok", columns()).missing_columns().is_empty());
    }

    #[test]
    fn test_missing_cell_reads_empty() {
        let mut sheet = Sheet::new("Team A", columns());
        sheet.push_row(vec!["4".into()]);
        let row = &sheet.rows()[0];
        assert!(row.is_blank("name"));
        assert_eq!(row.text("country").unwrap(), "");
        assert_eq!(row.get("unknown"), &CellValue::Empty);
    }

    #[test]
    fn test_error_cell() {
        let mut sheet = Sheet::new("Team A", vec!["dob".to_string()]);
        sheet.push_row(vec![CellValue::Error("#REF!".to_string())]);
        let error = sheet.rows()[0].date("dob").unwrap_err();
        assert_eq!(error.to_string(), "cell 'dob' holds error #REF!");
    }

    #[test]
    fn test_convert_calamine_cells() {
        assert_eq!(convert(&Data::String("Jane".into())), CellValue::from("Jane"));
        assert_eq!(convert(&Data::Float(1.5)), CellValue::Float(1.5));
        assert_eq!(convert(&Data::Empty), CellValue::Empty);
        assert!(matches!(
            convert(&Data::Error(calamine::CellErrorType::Ref)),
            CellValue::Error(_)
        ));
    }

    #[test]
    fn test_invalid_workbook_bytes() {
        let result = Workbook::from_bytes(b"not a spreadsheet");
        assert!(matches!(result, Err(BatchError::WorkbookLoad(_))));
    }

    #[test]
    fn test_total_rows() {
        let mut a = Sheet::new("A", columns());
        a.push_row(vec!["1".into()]);
        let mut b = Sheet::new("B", columns());
        b.push_row(vec!["2".into()]);
        b.push_row(vec!["3".into()]);
        assert_eq!(Workbook::new(vec![a, b]).total_rows(), 3);
    }
}
