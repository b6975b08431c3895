//! PDF Cross-Reference Parser
//!
//! Parses classic xref tables (ISO 32000-1 Section 7.5.4), cross-reference
//! streams (Section 7.5.8) and hybrid files, following `/Prev` chains.
//! When no usable xref exists the table can be rebuilt by scanning the file.

use super::lexer::{is_delimiter, is_whitespace, Lexer, Token};
use super::objects::ObjectParser;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, Stream};
use std::collections::{BTreeMap, HashSet};

/// Cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum XRefEntry {
    /// Free or deleted object
    Free,
    /// Object stored uncompressed at a byte offset
    InUse { offset: u64, generation: u16 },
    /// Object stored inside an object stream
    Compressed { stream: u32, index: u32 },
}

/// Merged cross-reference data of a file
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    trailer: Dictionary,
    recovered: bool,
}

/// Keys of an xref stream dictionary that describe the stream itself
const XREF_STREAM_KEYS: &[&str] = &[
    "Type",
    "Length",
    "Filter",
    "DecodeParms",
    "W",
    "Index",
    "Prev",
    "XRefStm",
];

impl XRefTable {
    /// Parse the cross-reference chain starting at the final `startxref`
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut table = Self::default();
        let mut next = Some(Self::find_xref_offset(data)?);
        let mut visited = HashSet::new();

        while let Some(offset) = next {
            if !visited.insert(offset) {
                tracing::warn!("xref /Prev chain loops back to offset {}", offset);
                break;
            }

            let section_trailer = table.parse_section(data, offset)?;
            next = section_trailer
                .get_integer("Prev")
                .and_then(|prev| usize::try_from(prev).ok());

            // Newer trailers take precedence
            for (key, value) in section_trailer.iter() {
                if !XREF_STREAM_KEYS.contains(&key.as_str()) && !table.trailer.contains_key(key) {
                    table.trailer.set(key.clone(), value.clone());
                }
            }
        }

        if table.entries.is_empty() {
            return Err(ParseError::InvalidXRef("no entries".to_string()));
        }

        Ok(table)
    }

    /// Offset named by the last `startxref` keyword, searched in the last 1024 bytes
    pub fn find_xref_offset(data: &[u8]) -> ParseResult<usize> {
        let tail_start = data.len().saturating_sub(1024);
        let tail = &data[tail_start..];

        let keyword = tail
            .windows(b"startxref".len())
            .rposition(|window| window == b"startxref")
            .ok_or_else(|| ParseError::InvalidXRef("startxref not found".to_string()))?;

        let mut lexer = Lexer::new_at(data, tail_start + keyword);
        lexer.next_token()?;
        match lexer.next_token()? {
            Token::Integer(offset) if offset >= 0 && (offset as usize) < data.len() => {
                Ok(offset as usize)
            }
            other => Err(ParseError::InvalidXRef(format!(
                "invalid startxref offset: {other:?}"
            ))),
        }
    }

    /// Parse one section (table or stream) and return its trailer dictionary
    fn parse_section(&mut self, data: &[u8], offset: usize) -> ParseResult<Dictionary> {
        let mut lexer = Lexer::new_at(data, offset);
        if lexer.next_token()? == Token::XRef {
            let (entries, trailer) = Self::parse_traditional_xref(&mut lexer)?;

            // Hybrid file: the stream section complements this table
            if let Some(stream_offset) = trailer
                .get_integer("XRefStm")
                .and_then(|value| usize::try_from(value).ok())
            {
                match Self::parse_xref_stream_at(data, stream_offset) {
                    Ok((stream_entries, _)) => self.merge(stream_entries),
                    Err(e) => tracing::warn!("ignoring unreadable /XRefStm section: {}", e),
                }
            }

            self.merge(entries);
            Ok(trailer)
        } else {
            let (entries, trailer) = Self::parse_xref_stream_at(data, offset)?;
            self.merge(entries);
            Ok(trailer)
        }
    }

    /// Insert entries not already defined by a newer section
    fn merge(&mut self, entries: Vec<(u32, XRefEntry)>) {
        for (number, entry) in entries {
            if number != 0 {
                self.entries.entry(number).or_insert(entry);
            }
        }
    }

    /// Parse a classic table; the lexer is positioned after the `xref` keyword
    fn parse_traditional_xref(
        lexer: &mut Lexer<'_>,
    ) -> ParseResult<(Vec<(u32, XRefEntry)>, Dictionary)> {
        let mut entries = Vec::new();

        loop {
            let first = match lexer.next_token()? {
                Token::Trailer => break,
                Token::Integer(first) => first,
                other => {
                    return Err(ParseError::InvalidXRef(format!(
                        "expected subsection header, found {other:?}"
                    )))
                }
            };
            let count = match lexer.next_token()? {
                Token::Integer(count) => count,
                other => {
                    return Err(ParseError::InvalidXRef(format!(
                        "expected subsection count, found {other:?}"
                    )))
                }
            };

            let first = u32::try_from(first)
                .map_err(|_| ParseError::InvalidXRef(format!("invalid object number {first}")))?;
            for i in 0..count.max(0) as u32 {
                let entry = Self::parse_xref_entry(lexer)?;
                entries.push((first + i, entry));
            }
        }

        let trailer = ObjectParser::new(lexer.data(), lexer.position())
            .parse_object()?
            .as_dict()
            .cloned()
            .ok_or(ParseError::InvalidTrailer)?;

        Ok((entries, trailer))
    }

    /// Entry format: `nnnnnnnnnn ggggg n|f`
    fn parse_xref_entry(lexer: &mut Lexer<'_>) -> ParseResult<XRefEntry> {
        let offset = match lexer.next_token()? {
            Token::Integer(value) if value >= 0 => value as u64,
            other => {
                return Err(ParseError::InvalidXRef(format!(
                    "expected entry offset, found {other:?}"
                )))
            }
        };
        let generation = match lexer.next_token()? {
            Token::Integer(value) => u16::try_from(value).unwrap_or(u16::MAX),
            other => {
                return Err(ParseError::InvalidXRef(format!(
                    "expected entry generation, found {other:?}"
                )))
            }
        };

        match lexer.next_token()? {
            Token::Keyword(flag) if flag == "n" => Ok(XRefEntry::InUse { offset, generation }),
            Token::Keyword(flag) if flag == "f" => Ok(XRefEntry::Free),
            other => Err(ParseError::InvalidXRef(format!(
                "expected entry flag, found {other:?}"
            ))),
        }
    }

    fn parse_xref_stream_at(
        data: &[u8],
        offset: usize,
    ) -> ParseResult<(Vec<(u32, XRefEntry)>, Dictionary)> {
        let (_, object) = ObjectParser::new(data, offset).parse_indirect_object()?;
        let stream = match object {
            Object::Stream(stream) if stream.dictionary().is_type("XRef") => stream,
            other => {
                return Err(ParseError::InvalidXRef(format!(
                    "offset {offset} holds a {} instead of an xref stream",
                    other.type_name()
                )))
            }
        };

        let entries = decode_xref_stream(&stream)?;
        Ok((entries, stream.dictionary().clone()))
    }

    /// Rebuild the table by scanning for `N G obj` headers.
    ///
    /// Later definitions of the same object number win, matching incremental
    /// updates. The trailer is merged from every `trailer` dictionary found.
    pub fn reconstruct(data: &[u8]) -> ParseResult<Self> {
        let mut table = Self {
            recovered: true,
            ..Self::default()
        };

        let mut search = 0;
        while let Some(found) = super::lexer::find_from(data, search, b"obj") {
            search = found + 3;
            if let Some((number, generation, start)) = object_header_before(data, found) {
                table.entries.insert(
                    number,
                    XRefEntry::InUse {
                        offset: start as u64,
                        generation,
                    },
                );
            }
        }

        let mut search = 0;
        let mut trailers = Vec::new();
        while let Some(found) = super::lexer::find_from(data, search, b"trailer") {
            search = found + b"trailer".len();
            if let Ok(Object::Dictionary(dict)) = ObjectParser::new(data, search).parse_object() {
                trailers.push(dict);
            }
        }
        for dict in trailers.into_iter().rev() {
            for (key, value) in dict.iter() {
                if !XREF_STREAM_KEYS.contains(&key.as_str()) && !table.trailer.contains_key(key) {
                    table.trailer.set(key.clone(), value.clone());
                }
            }
        }

        if table.entries.is_empty() {
            return Err(ParseError::InvalidXRef(
                "no objects found while scanning".to_string(),
            ));
        }

        Ok(table)
    }

    pub fn get_entry(&self, number: u32) -> Option<&XRefEntry> {
        self.entries.get(&number)
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &XRefEntry)> {
        self.entries.iter()
    }

    /// True when the table was rebuilt by scanning
    pub fn is_recovered(&self) -> bool {
        self.recovered
    }
}

/// Recognise `N G obj` ending just before `keyword`; returns number, generation, header start
fn object_header_before(data: &[u8], keyword: usize) -> Option<(u32, u16, usize)> {
    // "obj" must be a whole word
    let after = keyword + 3;
    if after < data.len() && !(is_whitespace(data[after]) || is_delimiter(data[after])) {
        return None;
    }

    let mut pos = keyword;
    let skip_ws = |mut pos: usize| {
        while pos > 0 && is_whitespace(data[pos - 1]) {
            pos -= 1;
        }
        pos
    };
    let digits_before = |end: usize| {
        let mut start = end;
        while start > 0 && data[start - 1].is_ascii_digit() {
            start -= 1;
        }
        (start < end).then_some(start)
    };

    let gen_end = skip_ws(pos);
    if gen_end == pos {
        return None;
    }
    let gen_start = digits_before(gen_end)?;
    pos = skip_ws(gen_start);
    if pos == gen_start {
        return None;
    }
    let num_start = digits_before(pos)?;
    if num_start > 0 && !(is_whitespace(data[num_start - 1]) || is_delimiter(data[num_start - 1]))
    {
        return None;
    }

    let number = std::str::from_utf8(&data[num_start..pos]).ok()?.parse().ok()?;
    let generation = std::str::from_utf8(&data[gen_start..gen_end])
        .ok()?
        .parse()
        .ok()?;
    Some((number, generation, num_start))
}

/// Decode the binary entries of an xref stream
pub fn decode_xref_stream(stream: &Stream) -> ParseResult<Vec<(u32, XRefEntry)>> {
    let dict = stream.dictionary();

    let size = dict
        .get_integer("Size")
        .ok_or_else(|| ParseError::MissingKey("Size".to_string()))?;

    let index: Vec<(u32, u32)> = match dict.get_array("Index") {
        Some(array) => {
            if array.len() % 2 != 0 {
                return Err(ParseError::InvalidXRef(
                    "Index array must have an even number of elements".to_string(),
                ));
            }
            array
                .chunks(2)
                .map(|pair| match (pair[0].as_integer(), pair[1].as_integer()) {
                    (Some(first), Some(count)) if first >= 0 && count >= 0 => {
                        Ok((first as u32, count as u32))
                    }
                    _ => Err(ParseError::InvalidXRef(
                        "Index values must be non-negative integers".to_string(),
                    )),
                })
                .collect::<ParseResult<_>>()?
        }
        None => vec![(0, size.max(0) as u32)],
    };

    let widths: Vec<usize> = dict
        .get_array("W")
        .ok_or_else(|| ParseError::MissingKey("W".to_string()))?
        .iter()
        .map(|obj| match obj.as_integer() {
            Some(width) if (0..=8).contains(&width) => Ok(width as usize),
            _ => Err(ParseError::InvalidXRef("invalid W entry".to_string())),
        })
        .collect::<ParseResult<_>>()?;
    if widths.len() != 3 {
        return Err(ParseError::InvalidXRef(
            "W array must have exactly 3 elements".to_string(),
        ));
    }

    let data = super::filters::decode_stream(stream.data(), dict)?;
    let row_length: usize = widths.iter().sum();
    let mut rows = data.chunks_exact(row_length.max(1));
    let mut entries = Vec::new();

    for (first, count) in index {
        for i in 0..count {
            let row = rows
                .next()
                .ok_or_else(|| ParseError::InvalidXRef("xref stream data truncated".to_string()))?;
            let (field1, rest) = row.split_at(widths[0]);
            let (field2, field3) = rest.split_at(widths[1]);

            // A zero-width type field defaults to type 1
            let kind = if widths[0] == 0 { 1 } else { read_field(field1) };
            let field2 = read_field(field2);
            let field3 = read_field(field3);

            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InUse {
                    offset: field2,
                    generation: u16::try_from(field3).unwrap_or(u16::MAX),
                },
                2 => XRefEntry::Compressed {
                    stream: field2 as u32,
                    index: field3 as u32,
                },
                other => {
                    tracing::debug!("unknown xref entry type {} for object {}", other, first + i);
                    XRefEntry::Free
                }
            };
            entries.push((first + i, entry));
        }
    }

    Ok(entries)
}

/// Big-endian unsigned integer of any width up to 8 bytes
fn read_field(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |value, &byte| (value << 8) | u64::from(byte))
}
