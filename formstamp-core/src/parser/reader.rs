//! PDF File Reader
//!
//! Turns a complete file buffer into a [`Document`]: header, cross-reference
//! data, every live object (including those packed in object streams) and
//! the trailer entries worth keeping.

use super::lexer::find_from;
use super::object_stream::ObjectStream;
use super::objects::{LengthResolver, ObjectParser};
use super::xref::{XRefEntry, XRefTable};
use super::{ParseError, ParseResult};
use crate::document::Document;
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::BTreeMap;

/// Trailer keys carried over into the loaded document
const KEPT_TRAILER_KEYS: &[&str] = &["Root", "Info", "ID"];

/// Load a document from the bytes of a PDF file
pub fn load_document(data: &[u8]) -> Result<Document> {
    if data.is_empty() {
        return Err(ParseError::EmptyFile.into());
    }
    let version = parse_header(data)?;

    let table = match XRefTable::parse(data) {
        Ok(table) if table.trailer().contains_key("Root") => table,
        Ok(_) => {
            tracing::warn!("trailer has no /Root, rebuilding cross-reference table");
            XRefTable::reconstruct(data)?
        }
        Err(e) => {
            tracing::warn!("cross-reference data unusable ({}), rebuilding by scanning", e);
            XRefTable::reconstruct(data)?
        }
    };

    let (mut loaded, failures) = load_objects(data, &table);
    if failures > 0 && !table.is_recovered() {
        tracing::warn!(
            "{} objects unreadable at their xref offsets, rebuilding by scanning",
            failures
        );
        let table = XRefTable::reconstruct(data)?;
        loaded = load_objects(data, &table).0;
    }

    let (objects, trailer) = loaded;
    Document::from_parts(version, objects, trailer)
}

type Loaded = (BTreeMap<ObjectId, Object>, Dictionary);

/// Read every object named by `table`, returning what could be read and
/// the number of entries that failed.
fn load_objects(data: &[u8], table: &XRefTable) -> (Loaded, usize) {
    let lengths = XRefLengths { data, table };
    let mut objects = BTreeMap::new();
    let mut failures = 0;
    let mut compressed: BTreeMap<u32, Vec<(u32, u32)>> = BTreeMap::new();

    for (&number, entry) in table.iter() {
        match *entry {
            XRefEntry::Free => {}
            XRefEntry::InUse { offset, .. } => {
                let parsed = ObjectParser::new(data, offset as usize)
                    .with_lengths(&lengths)
                    .parse_indirect_object();
                match parsed {
                    Ok((id, object)) if id.number() == number => {
                        objects.insert(id, object);
                    }
                    Ok((id, _)) => {
                        tracing::warn!("xref entry for object {} points at object {}", number, id);
                        failures += 1;
                    }
                    Err(e) => {
                        tracing::warn!("failed to parse object {}: {}", number, e);
                        failures += 1;
                    }
                }
            }
            XRefEntry::Compressed { stream, index } => {
                compressed.entry(stream).or_default().push((number, index));
            }
        }
    }

    for (stream_number, members) in compressed {
        let Some(parsed) = parse_object_stream(&objects, stream_number) else {
            failures += members.len();
            continue;
        };
        for (number, index) in members {
            match parsed.get_by_index(index, number) {
                Some(object) => {
                    objects.insert(ObjectId::new(number, 0), object.clone());
                }
                None => {
                    tracing::warn!("object {} missing from object stream {}", number, stream_number);
                    failures += 1;
                }
            }
        }
    }

    // A scanned file has no compressed entries: unpack every object stream found
    if table.is_recovered() {
        let stream_numbers: Vec<u32> = objects
            .iter()
            .filter(|(_, object)| is_stream_of_type(object, "ObjStm"))
            .map(|(id, _)| id.number())
            .collect();
        for stream_number in stream_numbers {
            if let Some(parsed) = parse_object_stream(&objects, stream_number) {
                for (number, object) in parsed.objects() {
                    if !objects.keys().any(|id| id.number() == number) {
                        objects.insert(ObjectId::new(number, 0), object.clone());
                    }
                }
            }
        }
    }

    let trailer = build_trailer(table.trailer(), &objects);

    objects.retain(|_, object| {
        !is_stream_of_type(object, "ObjStm") && !is_stream_of_type(object, "XRef")
    });

    ((objects, trailer), failures)
}

fn parse_object_stream(
    objects: &BTreeMap<ObjectId, Object>,
    stream_number: u32,
) -> Option<ObjectStream> {
    let stream = objects
        .iter()
        .find(|(id, _)| id.number() == stream_number)
        .and_then(|(_, object)| object.as_stream());

    let Some(stream) = stream else {
        tracing::warn!("object stream {} not found", stream_number);
        return None;
    };

    match ObjectStream::parse(stream) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("failed to read object stream {}: {}", stream_number, e);
            None
        }
    }
}

fn is_stream_of_type(object: &Object, type_name: &str) -> bool {
    object
        .as_stream()
        .is_some_and(|stream| stream.dictionary().is_type(type_name))
}

/// Keep the document-level trailer keys; `/Encrypt` is carried so the
/// document constructor can reject it.
fn build_trailer(source: &Dictionary, objects: &BTreeMap<ObjectId, Object>) -> Dictionary {
    let mut trailer = Dictionary::new();
    for key in KEPT_TRAILER_KEYS.iter().chain(["Encrypt"].iter()) {
        if let Some(value) = source.get(key) {
            trailer.set(*key, value.clone());
        }
    }

    if !trailer.contains_key("Root") {
        // Cross-reference streams carry trailer keys in their dictionary
        let from_xref_stream = objects
            .values()
            .filter(|object| is_stream_of_type(object, "XRef"))
            .filter_map(|object| object.as_dict()?.get("Root").cloned())
            .last();
        let catalog = from_xref_stream.or_else(|| {
            objects
                .iter()
                .find(|(_, object)| object.as_dict().is_some_and(|d| d.is_type("Catalog")))
                .map(|(id, _)| Object::Reference(*id))
        });
        if let Some(root) = catalog {
            tracing::debug!("using {:?} as document catalog", root);
            trailer.set("Root", root);
        }
    }

    trailer
}

/// Extract the version from `%PDF-x.y`, which must start within the first 1024 bytes
fn parse_header(data: &[u8]) -> ParseResult<String> {
    let window = &data[..data.len().min(1024)];
    let start = find_from(window, 0, b"%PDF-").ok_or(ParseError::InvalidHeader)? + 5;

    let version: String = data[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|b| *b as char)
        .collect();

    let mut parts = version.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(major), Some(minor), None) if !major.is_empty() && !minor.is_empty() => Ok(version),
        _ => Err(ParseError::InvalidHeader),
    }
}

/// Resolves indirect stream lengths through the cross-reference table
struct XRefLengths<'a> {
    data: &'a [u8],
    table: &'a XRefTable,
}

impl LengthResolver for XRefLengths<'_> {
    fn resolve_length(&self, id: ObjectId) -> Option<usize> {
        match self.table.get_entry(id.number())? {
            XRefEntry::InUse { offset, .. } => {
                let (_, object) = ObjectParser::new(self.data, *offset as usize)
                    .parse_indirect_object()
                    .ok()?;
                object.as_integer().and_then(|len| usize::try_from(len).ok())
            }
            _ => None,
        }
    }
}
