//! Resolved form fields

use crate::forms::FieldType;
use crate::objects::ObjectId;
use std::collections::BTreeMap;
use std::fmt;

/// A field dictionary located in the form tree
#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    /// Fully-qualified name: partial names joined with `.`
    pub name: String,
    /// The field dictionary
    pub id: ObjectId,
    /// Widget annotations merged into this field (kids without `/T`)
    pub widgets: Vec<ObjectId>,
    /// `/FT`, possibly inherited from an ancestor
    pub field_type: Option<FieldType>,
}

/// What a fully-qualified name resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum FieldHandle {
    /// Terminal text field
    Text(FieldNode),
    /// Terminal choice field (combo box or list box)
    Choice(FieldNode),
    /// Non-terminal field whose kids carry their own names
    Group(FieldNode),
    /// Buttons, signatures and fields without a known type
    Unsupported(FieldNode),
}

impl FieldHandle {
    pub fn node(&self) -> &FieldNode {
        match self {
            FieldHandle::Text(node)
            | FieldHandle::Choice(node)
            | FieldHandle::Group(node)
            | FieldHandle::Unsupported(node) => node,
        }
    }

    pub fn name(&self) -> &str {
        &self.node().name
    }

    /// Only text and choice fields take text values
    pub fn is_writable(&self) -> bool {
        matches!(self, FieldHandle::Text(_) | FieldHandle::Choice(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FieldHandle::Text(_) => "text",
            FieldHandle::Choice(_) => "choice",
            FieldHandle::Group(_) => "group",
            FieldHandle::Unsupported(node) => match node.field_type {
                Some(FieldType::Button) => "button",
                Some(FieldType::Signature) => "signature",
                _ => "unknown",
            },
        }
    }
}

impl fmt::Display for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.kind())
    }
}

/// Fields of one document keyed by fully-qualified name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldHandle>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the name is taken; returns false for a duplicate
    pub fn insert(&mut self, handle: FieldHandle) -> bool {
        let name = handle.name().to_string();
        if self.fields.contains_key(&name) {
            return false;
        }
        self.fields.insert(name, handle);
        true
    }

    pub fn get(&self, name: &str) -> Option<&FieldHandle> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldHandle> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
