//! Loading damaged and unsupported files

mod common;

use common::{field_names, worksheet_bytes};
use formstamp::{Document, PdfError};

fn replace(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    let at = data
        .windows(from.len())
        .rposition(|w| w == from)
        .expect("pattern present");
    let mut out = data[..at].to_vec();
    out.extend_from_slice(to);
    out.extend_from_slice(&data[at + from.len()..]);
    out
}

#[test]
fn test_wrong_startxref_is_recovered() {
    let bytes = worksheet_bytes();
    let text = String::from_utf8_lossy(&bytes);
    let offset = text
        .rsplit("startxref")
        .next()
        .and_then(|tail| tail.split_whitespace().next())
        .unwrap()
        .to_string();

    let broken = replace(
        &bytes,
        format!("startxref\n{offset}").as_bytes(),
        b"startxref\n0",
    );
    let doc = Document::load(&broken).unwrap();
    assert_eq!(field_names(&doc).len(), 13);
}

#[test]
fn test_missing_xref_table_is_recovered() {
    let bytes = worksheet_bytes();
    let broken = replace(&bytes, b"\nxref\n", b"\njunk\n");
    let doc = Document::load(&broken).unwrap();
    assert!(field_names(&doc).contains(&"name".to_string()));
}

#[test]
fn test_encrypted_document_is_rejected() {
    let bytes = worksheet_bytes();
    let broken = replace(&bytes, b"trailer\n<<", b"trailer\n<< /Encrypt 1 0 R");
    assert!(matches!(Document::load(&broken), Err(PdfError::Encrypted)));
}

#[test]
fn test_file_without_catalog_fails() {
    let data = b"%PDF-1.4\n1 0 obj\n<< /Type /Page >>\nendobj\ntrailer\n<< /Size 2 >>\n%%EOF\n";
    assert!(Document::load(data).is_err());
}
