//! Load → clone → serialize → reload integration tests

mod common;

use common::{assessment_bytes, field_names, form_document, worksheet_bytes};
use formstamp::{Document, Object, ObjectId, PdfError};
use pretty_assertions::assert_eq;

#[test]
fn test_worksheet_roundtrip_keeps_field_names() {
    let template = Document::load(&worksheet_bytes()).unwrap();
    let names = field_names(&template);
    assert_eq!(names.len(), 13);
    assert!(names.contains(&"xcompetition".to_string()));
    assert!(names.contains(&"agree".to_string()));

    let copy = template.clone();
    let reloaded = Document::load(&copy.save_to_bytes().unwrap()).unwrap();
    assert_eq!(field_names(&reloaded), names);
    assert_eq!(reloaded.object_count(), template.object_count());
}

#[test]
fn test_roundtrip_preserves_object_graph() {
    let original = form_document(&["name", "dob"]);
    let mut reloaded = Document::load(&original.save_to_bytes().unwrap()).unwrap();

    // The writer adds /Length to every stream
    let ids: Vec<ObjectId> = reloaded.objects().map(|(id, _)| *id).collect();
    for id in ids {
        if let Some(Object::Stream(stream)) = reloaded.get_object_mut(id) {
            assert!(stream.dictionary_mut().remove("Length").is_some());
        }
    }

    assert_eq!(
        reloaded.objects().collect::<Vec<_>>(),
        original.objects().collect::<Vec<_>>()
    );
    assert_eq!(reloaded.root_id().unwrap(), original.root_id().unwrap());
}

#[test]
fn test_compressed_template_loads() {
    let template = Document::load(&assessment_bytes()).unwrap();
    assert_eq!(template.version(), "1.5");
    assert_eq!(field_names(&template), vec!["country", "dob", "name"]);

    // Object and xref streams are unpacked and dropped
    assert_eq!(template.object_count(), 7);
    assert!(template.get_object(ObjectId::new(8, 0)).is_none());

    let rewritten = template.save_to_bytes().unwrap();
    assert!(rewritten.windows(4).any(|w| w == b"xref"));
    let reloaded = Document::load(&rewritten).unwrap();
    assert_eq!(field_names(&reloaded), vec!["country", "dob", "name"]);
}

#[test]
fn test_clone_is_independent_of_template() {
    let template = Document::load(&worksheet_bytes()).unwrap();
    let mut copy = template.clone();
    let root = copy.root_id().unwrap();
    copy.set_object(root, Object::Null);

    assert!(template.catalog().is_ok());
    assert!(copy.catalog().is_err());
}

#[test]
fn test_unusable_inputs_fail_to_load() {
    assert!(Document::load(b"").is_err());
    assert!(Document::load(b"GIF89a not a pdf").is_err());

    let bytes = worksheet_bytes();
    let truncated = &bytes[..40];
    assert!(Document::load(truncated).is_err());
}

#[test]
fn test_dangling_reference_fails_serialization() {
    let mut doc = form_document(&["name"]);
    let root = doc.root_id().unwrap();
    doc.get_dictionary_mut(root)
        .unwrap()
        .set("Outlines", ObjectId::new(900, 0));

    assert!(matches!(
        doc.save_to_bytes(),
        Err(PdfError::InvalidObjectReference(900, 0))
    ));
}
