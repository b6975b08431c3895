use crate::objects::{Dictionary, PdfString, Stream};
use std::fmt;

/// Indirect object identifier: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(PdfString),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    /// Name object, e.g. `Object::name("Catalog")` for `/Catalog`.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    /// Text string, encoded as PDFDocEncoding or UTF-16BE as needed.
    pub fn text(text: &str) -> Self {
        Object::String(PdfString::from_text(text))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(f) => Some(*f),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Dictionary view; for streams this is the stream dictionary.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(stream.dictionary()),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(stream) => Some(stream.dictionary_mut()),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    /// Calls `f` for every reference held directly or nested inside this object.
    pub fn for_each_reference(&self, f: &mut impl FnMut(ObjectId)) {
        match self {
            Object::Reference(id) => f(*id),
            Object::Array(items) => {
                for item in items {
                    item.for_each_reference(f);
                }
            }
            Object::Dictionary(dict) => {
                for value in dict.values() {
                    value.for_each_reference(f);
                }
            }
            Object::Stream(stream) => {
                for value in stream.dictionary().values() {
                    value.for_each_reference(f);
                }
            }
            _ => {}
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(f)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::text(s)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::text(&s)
    }
}

impl From<PdfString> for Object {
    fn from(s: PdfString) -> Self {
        Object::String(s)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<Stream> for Object {
    fn from(s: Stream) -> Self {
        Object::Stream(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display_and_order() {
        let a = ObjectId::new(3, 0);
        let b = ObjectId::new(10, 0);
        assert_eq!(a.to_string(), "3 0 R");
        assert!(a < b);
        assert_eq!(b.number(), 10);
        assert_eq!(b.generation(), 0);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Object::from(true).as_bool(), Some(true));
        assert_eq!(Object::from(7).as_integer(), Some(7));
        assert_eq!(Object::from(7).as_real(), Some(7.0));
        assert_eq!(Object::name("Tx").as_name(), Some("Tx"));
        assert_eq!(Object::Null.as_name(), None);
        assert!(Object::Null.is_null());
        assert_eq!(
            Object::Reference(ObjectId::new(4, 0)).as_reference(),
            Some(ObjectId::new(4, 0))
        );
    }

    #[test]
    fn test_text_constructor_encodes_string() {
        let obj = Object::from("Jane");
        assert_eq!(obj.as_string().map(|s| s.as_bytes()), Some(&b"Jane"[..]));
    }

    #[test]
    fn test_stream_exposes_dictionary() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("XObject"));
        let mut obj = Object::Stream(Stream::new(dict, b"q Q".to_vec()));

        assert_eq!(obj.as_dict().and_then(|d| d.get_name("Type")), Some("XObject"));
        if let Some(dict) = obj.as_dict_mut() {
            dict.set("Subtype", Object::name("Form"));
        }
        assert_eq!(obj.as_dict().and_then(|d| d.get_name("Subtype")), Some("Form"));
    }

    #[test]
    fn test_for_each_reference_walks_nested_values() {
        let mut inner = Dictionary::new();
        inner.set("P", ObjectId::new(2, 0));
        let obj = Object::Array(vec![
            Object::Reference(ObjectId::new(1, 0)),
            Object::Dictionary(inner),
            Object::Integer(5),
        ]);

        let mut seen = Vec::new();
        obj.for_each_reference(&mut |id| seen.push(id.number()));
        seen.sort();
        assert_eq!(seen, vec![1, 2]);
    }
}
