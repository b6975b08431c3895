use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId, PdfString};
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes a [`Document`] with a classic cross-reference table
pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<ObjectId, u64>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    /// Write the whole document. Fails before writing anything if an object
    /// refers to an object the document does not contain.
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        if let Some(id) = document.dangling_references().into_iter().next() {
            return Err(PdfError::InvalidObjectReference(id.number(), id.generation()));
        }
        let root = document.root_id()?;

        self.write_header(document.version())?;
        for (id, object) in document.objects() {
            self.write_object(*id, object)?;
        }

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(root, document.trailer(), xref_position)?;

        self.writer.flush()?;
        Ok(())
    }

    fn write_header(&mut self, version: &str) -> Result<()> {
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }
}

impl PdfWriter<BufWriter<std::fs::File>> {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new_with_writer(BufWriter::new(file)))
    }
}

impl<W: Write> PdfWriter<W> {
    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        self.xref_positions.insert(id, self.current_position);

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        self.write_object_value(object)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_object_value(&mut self, object: &Object) -> Result<()> {
        match object {
            Object::Null => self.write_bytes(b"null")?,
            Object::Boolean(b) => self.write_bytes(if *b { b"true" } else { b"false" })?,
            Object::Integer(i) => self.write_bytes(i.to_string().as_bytes())?,
            Object::Real(f) => self.write_bytes(format_real(*f).as_bytes())?,
            Object::String(s) => self.write_bytes(&encode_string(s))?,
            Object::Name(n) => self.write_bytes(&encode_name(n))?,
            Object::Array(arr) => {
                self.write_bytes(b"[")?;
                for (i, obj) in arr.iter().enumerate() {
                    if i > 0 {
                        self.write_bytes(b" ")?;
                    }
                    self.write_object_value(obj)?;
                }
                self.write_bytes(b"]")?;
            }
            Object::Dictionary(dict) => self.write_dictionary(dict)?,
            Object::Stream(stream) => {
                let mut dict = stream.dictionary().clone();
                dict.set("Length", stream.data().len() as i64);
                self.write_dictionary(&dict)?;
                self.write_bytes(b"\nstream\n")?;
                self.write_bytes(stream.data())?;
                self.write_bytes(b"\nendstream")?;
            }
            Object::Reference(id) => {
                let ref_str = format!("{} {} R", id.number(), id.generation());
                self.write_bytes(ref_str.as_bytes())?;
            }
        }
        Ok(())
    }

    fn write_dictionary(&mut self, dict: &Dictionary) -> Result<()> {
        self.write_bytes(b"<<")?;
        for (key, value) in dict.sorted_entries() {
            self.write_bytes(b"\n")?;
            self.write_bytes(&encode_name(key))?;
            self.write_bytes(b" ")?;
            self.write_object_value(value)?;
        }
        self.write_bytes(b"\n>>")?;
        Ok(())
    }

    /// One subsection per run of consecutive object numbers, object 0 always free
    fn write_xref(&mut self) -> Result<()> {
        self.write_bytes(b"xref\n")?;

        let mut entries: Vec<(u32, Option<(u64, u16)>)> = vec![(0, None)];
        entries.extend(
            self.xref_positions
                .iter()
                .map(|(id, pos)| (id.number(), Some((*pos, id.generation())))),
        );

        let mut start = 0;
        while start < entries.len() {
            let mut end = start + 1;
            while end < entries.len() && entries[end].0 == entries[end - 1].0 + 1 {
                end += 1;
            }

            let header = format!("{} {}\n", entries[start].0, end - start);
            self.write_bytes(header.as_bytes())?;
            for (_, entry) in &entries[start..end] {
                let line = match entry {
                    Some((position, generation)) => format!("{position:010} {generation:05} n \n"),
                    None => "0000000000 65535 f \n".to_string(),
                };
                self.write_bytes(line.as_bytes())?;
            }
            start = end;
        }

        Ok(())
    }

    fn write_trailer(
        &mut self,
        root: ObjectId,
        source: &Dictionary,
        xref_position: u64,
    ) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(|id| id.number())
            .max()
            .unwrap_or(0);

        let mut trailer = Dictionary::new();
        trailer.set("Size", Object::Integer(i64::from(max_obj_num) + 1));
        trailer.set("Root", Object::Reference(root));
        for key in ["Info", "ID"] {
            if let Some(value) = source.get(key) {
                trailer.set(key, value.clone());
            }
        }

        self.write_bytes(b"trailer\n")?;
        self.write_dictionary(&trailer)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Shortest decimal form that reads back as the same value; always carries a
/// point so the reader keeps it a real (PDF has no exponent notation)
fn format_real(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0.0".to_string();
    }
    let mut formatted = value.to_string();
    if !formatted.contains('.') {
        formatted.push_str(".0");
    }
    formatted
}

/// Literal string with escapes, or a hex string when the content is mostly binary
fn encode_string(string: &PdfString) -> Vec<u8> {
    let bytes = string.as_bytes();
    let binary = bytes
        .iter()
        .filter(|b| !(b.is_ascii_graphic() || matches!(**b, b' ' | b'\n' | b'\r' | b'\t')))
        .count();

    if binary * 4 > bytes.len() {
        let mut out = Vec::with_capacity(bytes.len() * 2 + 2);
        out.push(b'<');
        for byte in bytes {
            out.extend_from_slice(format!("{byte:02X}").as_bytes());
        }
        out.push(b'>');
        return out;
    }

    let mut out = Vec::with_capacity(bytes.len() + 2);
    out.push(b'(');
    for &byte in bytes {
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            0x20..=0x7E => out.push(byte),
            _ => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
        }
    }
    out.push(b')');
    out
}

/// `/Name` with every irregular character written as `#xx`
fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.len() + 1);
    out.push(b'/');
    for ch in name.chars() {
        let mut buf = [0u8; 4];
        // Names are stored one char per byte; anything wider goes out as UTF-8
        let bytes: &[u8] = match u8::try_from(u32::from(ch)) {
            Ok(byte) => {
                buf[0] = byte;
                &buf[..1]
            }
            Err(_) => ch.encode_utf8(&mut buf).as_bytes(),
        };
        for &byte in bytes {
            let regular = (0x21..=0x7E).contains(&byte)
                && !crate::parser::lexer::is_delimiter(byte)
                && byte != b'#';
            if regular {
                out.push(byte);
            } else {
                out.extend_from_slice(format!("#{byte:02X}").as_bytes());
            }
        }
    }
    out
}
