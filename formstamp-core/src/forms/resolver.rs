//! Field tree walk (ISO 32000-1 Section 12.7.3)

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::forms::{FieldHandle, FieldMap, FieldNode, FieldType};
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::HashSet;

/// The interactive form dictionary, whether stored inline in the catalog or
/// as an indirect object
pub fn acro_form(doc: &Document) -> Result<&Dictionary> {
    let catalog = doc.catalog()?;
    let entry = catalog.get("AcroForm").ok_or(PdfError::NoForm)?;
    doc.resolve(entry).as_dict().ok_or(PdfError::NoForm)
}

/// Enumerate every field of the document's form by fully-qualified name
pub fn resolve_fields(doc: &Document) -> Result<FieldMap> {
    let form = acro_form(doc)?;
    let mut walker = FieldWalker {
        doc,
        visited: HashSet::new(),
        fields: FieldMap::new(),
    };

    let roots = match form.get("Fields") {
        Some(fields) => doc.resolve(fields).as_array().map(Vec::as_slice),
        None => None,
    }
    .unwrap_or_default();

    for entry in roots {
        match entry.as_reference() {
            Some(id) => walker.visit(id, None, None),
            None => tracing::warn!("skipping direct object in /Fields array"),
        }
    }

    tracing::debug!("resolved {} form fields", walker.fields.len());
    Ok(walker.fields)
}

struct FieldWalker<'a> {
    doc: &'a Document,
    visited: HashSet<ObjectId>,
    fields: FieldMap,
}

impl FieldWalker<'_> {
    fn visit(&mut self, id: ObjectId, parent: Option<&str>, inherited: Option<FieldType>) {
        if !self.visited.insert(id) {
            tracing::debug!("field {} already visited", id);
            return;
        }
        let Some(dict) = self.doc.get_dictionary(id) else {
            tracing::warn!("field {} is not a dictionary", id);
            return;
        };

        let name = match (parent, self.partial_name(dict)) {
            (Some(parent), Some(partial)) => format!("{parent}.{partial}"),
            (None, Some(partial)) => partial,
            (_, None) => {
                tracing::debug!("field {} has no partial name, skipping", id);
                return;
            }
        };
        let field_type = self.field_type(dict).or(inherited);

        let mut named_kids = Vec::new();
        let mut widgets = Vec::new();
        for kid in self.kids(dict) {
            match self.doc.get_dictionary(kid) {
                Some(kid_dict) if kid_dict.contains_key("T") => named_kids.push(kid),
                Some(_) => widgets.push(kid),
                None => tracing::warn!("kid {} of field '{}' is missing", kid, name),
            }
        }

        let node = FieldNode {
            name: name.clone(),
            id,
            widgets,
            field_type,
        };
        let handle = if !named_kids.is_empty() {
            FieldHandle::Group(node)
        } else {
            match field_type {
                Some(FieldType::Text) => FieldHandle::Text(node),
                Some(FieldType::Choice) => FieldHandle::Choice(node),
                _ => FieldHandle::Unsupported(node),
            }
        };

        if !self.fields.insert(handle) {
            tracing::warn!("duplicate field name '{}' at {}, keeping the first", name, id);
            return;
        }

        for kid in named_kids {
            self.visit(kid, Some(&name), field_type);
        }
    }

    fn partial_name(&self, dict: &Dictionary) -> Option<String> {
        let partial = self.doc.resolve(dict.get("T")?).as_string()?.to_text();
        Some(partial)
    }

    fn field_type(&self, dict: &Dictionary) -> Option<FieldType> {
        let name = self.doc.resolve(dict.get("FT")?).as_name()?;
        FieldType::from_pdf_name(name)
    }

    fn kids(&self, dict: &Dictionary) -> Vec<ObjectId> {
        let Some(kids) = dict.get("Kids") else {
            return Vec::new();
        };
        self.doc
            .resolve(kids)
            .as_array()
            .map(|kids| kids.iter().filter_map(Object::as_reference).collect())
            .unwrap_or_default()
    }
}
