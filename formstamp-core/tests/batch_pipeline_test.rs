//! Spreadsheet-to-archive batch generation

mod common;

use common::{archive_document, field_value, players_sheet, templates, Player};
use formstamp::batch::{BatchOptions, BatchState, FormBatch, ProgressInfo};
use formstamp::{CellValue, Sheet, Workbook, REQUIRED_COLUMNS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

const JANE_WORKSHEET: &str = "Team A/Stages 2C and 3/Jane Doe-Worksheet-Stages-2C-and-3.pdf";
const JANE_ASSESSMENT: &str = "Team A/Stages 2AB/Jane Doe-Assessment-Form-Stages-2AB.pdf";

fn recording_options() -> (BatchOptions, Arc<Mutex<Vec<ProgressInfo>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let options = BatchOptions::default().with_progress_callback(move |info| {
        sink.lock().unwrap().push(info.clone());
    });
    (options, events)
}

#[test]
fn test_jane_doe_scenario() {
    let jane = Player {
        number: "4",
        class: "1.0",
        name: "Jane Doe",
        country: "USA",
        date: "01/02/2024",
        competition: "World Cup",
        dob: "05/10/1995",
    };
    let workbook = Workbook::new(vec![players_sheet("Team A", &[jane])]);

    let mut batch = FormBatch::new(templates(), BatchOptions::default());
    let report = batch.run(&workbook).unwrap();
    assert_eq!(batch.state(), BatchState::Done);

    let summary = &report.summary;
    assert!(summary.is_success());
    assert_eq!(summary.failures.len(), 0);
    assert_eq!(summary.generated_documents, 2);
    assert_eq!(
        summary.entries().collect::<Vec<_>>(),
        vec![JANE_WORKSHEET, JANE_ASSESSMENT]
    );

    let worksheet = archive_document(&report.archive, JANE_WORKSHEET).unwrap();
    assert_eq!(field_value(&worksheet, "date").as_deref(), Some("01-02-2024"));
    assert_eq!(field_value(&worksheet, "xdate").as_deref(), Some("01-02-2024"));
    assert_eq!(field_value(&worksheet, "number").as_deref(), Some("4"));
    assert_eq!(field_value(&worksheet, "proposed-class").as_deref(), Some("1.0"));
    assert_eq!(field_value(&worksheet, "xcompetition").as_deref(), Some("World Cup"));

    let assessment = archive_document(&report.archive, JANE_ASSESSMENT).unwrap();
    assert_eq!(field_value(&assessment, "dob").as_deref(), Some("05-10-1995"));
    assert_eq!(field_value(&assessment, "country").as_deref(), Some("USA"));
}

#[test]
fn test_blank_name_row_is_skipped() {
    let blank = Player::named("", "9");
    let workbook = Workbook::new(vec![players_sheet(
        "Team A",
        &[Player::named("Jane Doe", "4"), blank],
    )]);

    let (options, events) = recording_options();
    let mut batch = FormBatch::new(templates(), options);
    let report = batch.run(&workbook).unwrap();
    let summary = &report.summary;

    assert_eq!(summary.skipped_rows(), 1);
    assert_eq!(summary.generated_documents, 2);
    assert_eq!(summary.entries().count(), 2);
    assert_eq!(
        summary.failures,
        vec!["Skipping row 3 (name: '') in sheet 'Team A' due to missing 'name' or 'number'."]
    );
    assert!(!summary.is_success());

    let events = events.lock().unwrap();
    let counts: Vec<usize> = events.iter().map(|e| e.completed_units).collect();
    assert_eq!(counts, vec![1, 2, 4]);
    assert_eq!(events.last().unwrap().total_units, 4);
}

#[test]
fn test_failed_row_does_not_stop_later_rows() {
    let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut sheet = Sheet::new("Team A", columns);
    sheet.push_row(Player::named("Ann", "1").cells());
    let mut broken = Player::named("Bob", "2").cells();
    broken[6] = CellValue::Error("#REF!".to_string());
    sheet.push_row(broken);
    sheet.push_row(Player::named("Cat", "3").cells());

    let mut batch = FormBatch::new(templates(), BatchOptions::default());
    let report = batch.run(&Workbook::new(vec![sheet])).unwrap();
    let summary = &report.summary;

    assert_eq!(summary.failed_rows(), 1);
    assert_eq!(summary.failed_documents, 2);
    assert_eq!(summary.generated_documents, 4);
    assert_eq!(summary.completed_units, 6);
    assert!(summary.failures[0].starts_with("Error processing 'Bob' (row 3) from sheet 'Team A':"));
    assert!(summary.failures[0].contains("#REF!"));

    // Nothing was written for the failed row, even its worksheet
    assert!(!summary.entries().any(|e| e.contains("Bob")));
    let cat = archive_document(
        &report.archive,
        "Team A/Stages 2AB/Cat-Assessment-Form-Stages-2AB.pdf",
    )
    .unwrap();
    assert_eq!(field_value(&cat, "name").as_deref(), Some("Cat"));
}

#[test]
fn test_summary_json_caps_failure_preview() {
    let numbers: Vec<String> = (1..=7).map(|n| n.to_string()).collect();
    let players: Vec<Player<'_>> = numbers.iter().map(|n| Player::named("", n)).collect();
    let workbook = Workbook::new(vec![players_sheet("Team A", &players)]);

    let options = BatchOptions::default().with_preview_limit(2);
    let mut batch = FormBatch::new(templates(), options);
    let report = batch.run(&workbook).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&report.summary.to_json().unwrap()).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["problem_rows"], 7);
    assert_eq!(json["more_failures"], 5);
    assert_eq!(
        json["failure_preview"],
        serde_json::json!([
            "Skipping row 2 (name: '') in sheet 'Team A' due to missing 'name' or 'number'.",
            "Skipping row 3 (name: '') in sheet 'Team A' due to missing 'name' or 'number'.",
        ])
    );
    assert!(json.get("failures").is_none());
    assert_eq!(report.summary.failures.len(), 7);
}

#[test]
fn test_sheets_get_their_own_folders() {
    let workbook = Workbook::new(vec![
        players_sheet("Team A", &[Player::named("Jane Doe", "4")]),
        players_sheet("Team B", &[Player::named("Jane Doe", "4")]),
    ]);
    let mut batch = FormBatch::new(templates(), BatchOptions::default());
    let report = batch.run(&workbook).unwrap();

    let entries: Vec<_> = report.summary.entries().collect();
    assert_eq!(entries.len(), 4);
    assert!(entries.contains(&"Team B/Stages 2AB/Jane Doe-Assessment-Form-Stages-2AB.pdf"));
}

#[test]
fn test_cancel_from_callback_stops_remaining_rows() {
    let flag = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&flag);
    let options = BatchOptions::default()
        .with_cancel_flag(Arc::clone(&flag))
        .with_progress_callback(move |info| {
            if info.completed_units >= 2 {
                trigger.store(true, Ordering::SeqCst);
            }
        });

    let players = [
        Player::named("Ann", "1"),
        Player::named("Bob", "2"),
        Player::named("Cat", "3"),
    ];
    let workbook = Workbook::new(vec![players_sheet("Team A", &players)]);
    let mut batch = FormBatch::new(templates(), options);
    let report = batch.run(&workbook).unwrap();

    assert!(report.summary.cancelled);
    assert_eq!(report.summary.rows.len(), 1);
    assert_eq!(report.summary.completed_units, 2);
    assert_eq!(report.summary.total_units, 6);
    assert!(archive_document(
        &report.archive,
        "Team A/Stages 2AB/Ann-Assessment-Form-Stages-2AB.pdf"
    )
    .is_some());
}

#[derive(Debug, Clone, Copy)]
enum RowKind {
    Valid,
    BlankName,
    BrokenCell,
}

fn row_kind() -> impl Strategy<Value = RowKind> {
    prop_oneof![
        3 => Just(RowKind::Valid),
        1 => Just(RowKind::BlankName),
        1 => Just(RowKind::BrokenCell),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_progress_advances_two_units_per_row(kinds in prop::collection::vec(row_kind(), 0..6)) {
        let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut sheet = Sheet::new("Team A", columns);
        for (index, kind) in kinds.iter().enumerate() {
            let number = (index + 1).to_string();
            let name = format!("Player {index}");
            let mut cells = Player::named(&name, &number).cells();
            match kind {
                RowKind::Valid => {}
                RowKind::BlankName => cells[2] = CellValue::from("  "),
                RowKind::BrokenCell => cells[4] = CellValue::Error("#DIV/0!".to_string()),
            }
            sheet.push_row(cells);
        }

        let (options, events) = recording_options();
        let mut batch = FormBatch::new(templates(), options);
        let report = batch.run(&Workbook::new(vec![sheet])).unwrap();

        let rows = kinds.len();
        prop_assert_eq!(report.summary.total_units, 2 * rows);
        prop_assert_eq!(report.summary.completed_units, 2 * rows);

        let events = events.lock().unwrap();
        let mut previous = 0;
        for event in events.iter() {
            prop_assert!(event.completed_units > previous);
            prop_assert!(event.completed_units - previous <= 2);
            prop_assert_eq!(event.total_units, 2 * rows);
            previous = event.completed_units;
        }
        prop_assert_eq!(previous, 2 * rows);

        let valid = kinds.iter().filter(|k| matches!(k, RowKind::Valid)).count();
        prop_assert_eq!(report.summary.generated_documents, 2 * valid);
        prop_assert_eq!(report.summary.failures.len(), rows - valid);
    }
}
