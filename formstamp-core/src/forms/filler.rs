//! Writing field values
//!
//! Values are stored as `/V` text strings. Stale appearance streams are
//! dropped and the form's `/NeedAppearances` flag is raised so viewers
//! regenerate what the field looks like.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::forms::{resolve_fields, FieldHandle, FieldMap};
use crate::objects::{Dictionary, Object};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Result of writing one value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOutcome {
    Applied,
    /// No field carries the requested name
    NotFound,
    /// The name belongs to a group, button or signature
    UnsupportedKind,
}

/// Caller-supplied values keyed by fully-qualified field name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues(BTreeMap<String, String>);

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (name, value) in iter {
            values.insert(name, value);
        }
        values
    }
}

/// A value that could not be written; never fatal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldWarning {
    pub field: String,
    pub outcome: &'static str,
}

impl FieldWarning {
    fn new(field: &str, outcome: &'static str) -> Self {
        Self {
            field: field.to_string(),
            outcome,
        }
    }
}

impl fmt::Display for FieldWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {}", self.field, self.outcome)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FillReport {
    pub applied: Vec<String>,
    pub warnings: Vec<FieldWarning>,
}

/// Set the value of a resolved field and drop its appearance streams
pub fn apply(doc: &mut Document, handle: &FieldHandle, value: &str) -> Result<FieldOutcome> {
    if !handle.is_writable() {
        return Ok(FieldOutcome::UnsupportedKind);
    }
    let node = handle.node();

    let field = doc
        .get_dictionary_mut(node.id)
        .ok_or(PdfError::InvalidObjectReference(
            node.id.number(),
            node.id.generation(),
        ))?;
    field.set("V", Object::text(value));
    field.remove("AP");

    for widget in &node.widgets {
        if let Some(widget) = doc.get_dictionary_mut(*widget) {
            widget.remove("AP");
        }
    }

    tracing::debug!("set field '{}'", node.name);
    Ok(FieldOutcome::Applied)
}

/// Look `name` up in `fields` and apply the value to it
pub fn apply_named(
    doc: &mut Document,
    fields: &FieldMap,
    name: &str,
    value: &str,
) -> Result<FieldOutcome> {
    match fields.get(name) {
        Some(handle) => apply(doc, handle, value),
        None => Ok(FieldOutcome::NotFound),
    }
}

/// Raise `/NeedAppearances`, creating the form dictionary when the catalog
/// has none
pub fn set_need_appearances(doc: &mut Document) -> Result<()> {
    let existing = doc.catalog()?.get("AcroForm").cloned();

    if let Some(Object::Reference(id)) = existing {
        if let Some(form) = doc.get_dictionary_mut(id) {
            form.set("NeedAppearances", true);
            return Ok(());
        }
        tracing::warn!("/AcroForm points at missing object {}, replacing it", id);
    }

    let catalog = doc.catalog_mut()?;
    if let Some(form) = catalog.get_mut("AcroForm").and_then(Object::as_dict_mut) {
        form.set("NeedAppearances", true);
        return Ok(());
    }

    let mut form = Dictionary::new();
    form.set("Fields", Vec::<Object>::new());
    form.set("NeedAppearances", true);
    catalog.set("AcroForm", form);
    Ok(())
}

/// Resolve the form, write every value and raise `/NeedAppearances`.
///
/// A document without a form is filled leniently: each value is reported as
/// not found and an empty form dictionary is created.
pub fn fill_document(doc: &mut Document, values: &FieldValues) -> Result<FillReport> {
    let fields = match resolve_fields(doc) {
        Ok(fields) => fields,
        Err(PdfError::NoForm) => {
            tracing::warn!("document has no interactive form");
            FieldMap::new()
        }
        Err(e) => return Err(e),
    };

    let mut report = FillReport::default();
    for (name, value) in values.iter() {
        match apply_named(doc, &fields, name, value)? {
            FieldOutcome::Applied => report.applied.push(name.to_string()),
            FieldOutcome::NotFound => {
                tracing::warn!("could not fill '{}': no such field", name);
                report.warnings.push(FieldWarning::new(name, "not found"));
            }
            FieldOutcome::UnsupportedKind => {
                tracing::warn!("could not fill '{}': field kind is not writable", name);
                report
                    .warnings
                    .push(FieldWarning::new(name, "unsupported field kind"));
            }
        }
    }

    set_need_appearances(doc)?;
    Ok(report)
}
