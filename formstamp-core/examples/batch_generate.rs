//! Example: generate both forms for an in-memory roster
//!
//! Usage: cargo run --example batch_generate -- <templates-dir>
//!
//! The directory must contain the two form templates. The archive is
//! written to `output/Generated_Forms.zip`.

use formstamp::batch::{BatchOptions, FormBatch, ProgressBar, TemplateSet};
use formstamp::{CellValue, Sheet, Workbook, REQUIRED_COLUMNS};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let templates = TemplateSet::load_from_dir(&dir)?;

    let columns = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut sheet = Sheet::new("Team A", columns);
    for (number, name, country) in [(4, "Jane Doe", "USA"), (7, "Ana Silva", "BRA"), (9, "", "ESP")] {
        sheet.push_row(vec![
            CellValue::Int(number),
            CellValue::Float(1.0),
            CellValue::from(name),
            CellValue::from(country),
            CellValue::from("01/02/2024"),
            CellValue::from("World Cup"),
            CellValue::from("05/10/1995"),
        ]);
    }

    let bar = ProgressBar::new(30);
    let options = BatchOptions::default().with_progress_callback(move |info| {
        println!("{}", bar.render(info));
    });

    let mut batch = FormBatch::new(templates, options);
    let report = batch.run(&Workbook::new(vec![sheet]))?;

    fs::create_dir_all("output")?;
    fs::write("output/Generated_Forms.zip", &report.archive)?;

    println!("\n{}", report.summary.format_report(5));
    println!("✓ Archive written to output/Generated_Forms.zip");
    Ok(())
}
