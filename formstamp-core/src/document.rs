use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser;
use crate::writer::PdfWriter;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

static NULL: Object = Object::Null;

/// Depth limit when following chains of references to references
const MAX_REFERENCE_CHAIN: usize = 32;

/// An in-memory PDF: every indirect object keyed by its identifier, plus
/// the trailer entries that locate the catalog.
///
/// Objects refer to each other only through [`ObjectId`]s, so reference
/// cycles are legal and `Clone` produces a fully independent copy.
#[derive(Debug, Clone)]
pub struct Document {
    version: String,
    objects: BTreeMap<ObjectId, Object>,
    trailer: Dictionary,
}

impl Document {
    /// Empty PDF 1.7 document without a catalog
    pub fn new() -> Self {
        Self {
            version: "1.7".to_string(),
            objects: BTreeMap::new(),
            trailer: Dictionary::new(),
        }
    }

    /// Parse a complete PDF file
    pub fn load(data: &[u8]) -> Result<Self> {
        parser::load_document(data)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::load(&data)
    }

    pub(crate) fn from_parts(
        version: String,
        objects: BTreeMap<ObjectId, Object>,
        trailer: Dictionary,
    ) -> Result<Self> {
        if trailer.contains_key("Encrypt") {
            return Err(PdfError::Encrypted);
        }

        let document = Self {
            version,
            objects,
            trailer,
        };
        document.catalog()?;

        tracing::debug!(
            "loaded PDF {} with {} objects",
            document.version,
            document.objects.len()
        );
        Ok(document)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Dictionary (or stream dictionary) stored under `id`
    pub fn get_dictionary(&self, id: ObjectId) -> Option<&Dictionary> {
        self.get_object(id).and_then(Object::as_dict)
    }

    pub fn get_dictionary_mut(&mut self, id: ObjectId) -> Option<&mut Dictionary> {
        self.get_object_mut(id).and_then(Object::as_dict_mut)
    }

    /// Store `object` under the next free object number
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        let number = self
            .objects
            .keys()
            .next_back()
            .map_or(1, |id| id.number() + 1);
        let id = ObjectId::new(number, 0);
        self.objects.insert(id, object.into());
        id
    }

    pub fn set_object(&mut self, id: ObjectId, object: impl Into<Object>) {
        self.objects.insert(id, object.into());
    }

    pub fn set_root(&mut self, id: ObjectId) {
        self.trailer.set("Root", Object::Reference(id));
    }

    pub fn root_id(&self) -> Result<ObjectId> {
        self.trailer
            .get_reference("Root")
            .ok_or_else(|| PdfError::InvalidStructure("trailer has no /Root".to_string()))
    }

    pub fn catalog(&self) -> Result<&Dictionary> {
        let id = self.root_id()?;
        self.get_dictionary(id)
            .ok_or_else(|| PdfError::InvalidStructure(format!("catalog {id} is missing")))
    }

    pub fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let id = self.root_id()?;
        self.get_dictionary_mut(id)
            .ok_or_else(|| PdfError::InvalidStructure(format!("catalog {id} is missing")))
    }

    /// Follow references until a direct object is reached.
    ///
    /// A reference to a missing object resolves to null, as PDF readers do.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                Object::Reference(id) => current = self.objects.get(id).unwrap_or(&NULL),
                direct => return direct,
            }
        }
        &NULL
    }

    /// Identifiers of every object reachable from the trailer
    pub fn reachable_objects(&self) -> BTreeSet<ObjectId> {
        let mut visited = BTreeSet::new();
        let mut pending: Vec<ObjectId> = Vec::new();
        for value in self.trailer.values() {
            value.for_each_reference(&mut |id| pending.push(id));
        }

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(object) = self.objects.get(&id) {
                object.for_each_reference(&mut |next| {
                    if !visited.contains(&next) {
                        pending.push(next);
                    }
                });
            }
        }

        visited
    }

    /// References (from any object or the trailer) to objects not in the document
    pub fn dangling_references(&self) -> BTreeSet<ObjectId> {
        let mut dangling = BTreeSet::new();
        let mut check = |id: ObjectId| {
            if !self.objects.contains_key(&id) {
                dangling.insert(id);
            }
        };
        for object in self.objects.values() {
            object.for_each_reference(&mut check);
        }
        for value in self.trailer.values() {
            value.for_each_reference(&mut check);
        }
        dangling
    }

    /// Serialize to a complete PDF file
    pub fn save_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PdfWriter::new_with_writer(&mut buffer).write_document(self)?;
        Ok(buffer)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        PdfWriter::new(path)?.write_document(self)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
