//! PDF Object Parser
//!
//! Parses PDF objects from tokens according to ISO 32000-1 Section 7.3

use super::lexer::{find_from, is_whitespace, Lexer, Token};
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId, PdfString, Stream};

/// Resolves indirect `/Length` values of streams while parsing.
pub trait LengthResolver {
    fn resolve_length(&self, id: ObjectId) -> Option<usize>;
}

/// Resolver used where no cross-reference data is available yet; streams
/// with indirect lengths fall back to scanning for `endstream`.
pub struct NoLengths;

impl LengthResolver for NoLengths {
    fn resolve_length(&self, _id: ObjectId) -> Option<usize> {
        None
    }
}

/// Parses objects starting at a byte offset of a file buffer
pub struct ObjectParser<'a, 'r> {
    lexer: Lexer<'a>,
    lengths: &'r dyn LengthResolver,
}

impl<'a, 'r> ObjectParser<'a, 'r> {
    pub fn new(data: &'a [u8], position: usize) -> Self {
        Self {
            lexer: Lexer::new_at(data, position),
            lengths: &NoLengths,
        }
    }

    pub fn with_lengths(mut self, lengths: &'r dyn LengthResolver) -> Self {
        self.lengths = lengths;
        self
    }

    pub fn lexer_mut(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    /// Parse the next object
    pub fn parse_object(&mut self) -> ParseResult<Object> {
        let token = self.lexer.next_token()?;
        self.parse_from_token(token)
    }

    /// Parse `N G obj <object> endobj`
    pub fn parse_indirect_object(&mut self) -> ParseResult<(ObjectId, Object)> {
        let number = self.expect_integer("object number")?;
        let generation = self.expect_integer("generation number")?;
        match self.lexer.next_token()? {
            Token::Obj => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    expected: "obj".to_string(),
                    found: format!("{other:?}"),
                })
            }
        }

        let id = object_id(number, generation, self.lexer.position())?;
        let object = self.parse_object()?;

        // Some producers omit endobj; whatever follows belongs to the next object.
        match self.lexer.next_token()? {
            Token::EndObj => {}
            other => {
                tracing::debug!("object {} not terminated by endobj (found {:?})", id, other);
            }
        }

        Ok((id, object))
    }

    fn expect_integer(&mut self, what: &str) -> ParseResult<i64> {
        loop {
            match self.lexer.next_token()? {
                Token::Comment(_) => continue,
                Token::Integer(value) => return Ok(value),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: what.to_string(),
                        found: format!("{other:?}"),
                    })
                }
            }
        }
    }

    fn parse_from_token(&mut self, token: Token) -> ParseResult<Object> {
        match token {
            Token::Null => Ok(Object::Null),
            Token::Boolean(b) => Ok(Object::Boolean(b)),
            Token::Integer(i) => self.parse_integer_or_reference(i),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::String(s) => Ok(Object::String(PdfString::new(s))),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dictionary_or_stream(),
            Token::Comment(_) => self.parse_object(),
            Token::Eof => Err(ParseError::SyntaxError {
                position: self.lexer.position(),
                message: "Unexpected end of file".to_string(),
            }),
            _ => Err(ParseError::UnexpectedToken {
                expected: "PDF object".to_string(),
                found: format!("{token:?}"),
            }),
        }
    }

    /// `N G R` is a reference; anything else leaves the lookahead tokens in place.
    fn parse_integer_or_reference(&mut self, number: i64) -> ParseResult<Object> {
        let second = self.lexer.next_token()?;
        if let Token::Integer(generation) = second {
            let third = self.lexer.next_token()?;
            if third == Token::R {
                let id = object_id(number, generation, self.lexer.position())?;
                return Ok(Object::Reference(id));
            }
            self.lexer.push_token(third);
        }
        self.lexer.push_token(second);
        Ok(Object::Integer(number))
    }

    fn parse_array(&mut self) -> ParseResult<Object> {
        let mut elements = Vec::new();

        loop {
            let token = self.lexer.next_token()?;
            match token {
                Token::ArrayEnd => break,
                Token::Comment(_) => continue,
                _ => elements.push(self.parse_from_token(token)?),
            }
        }

        Ok(Object::Array(elements))
    }

    fn parse_dictionary_or_stream(&mut self) -> ParseResult<Object> {
        let dict = self.parse_dictionary_inner()?;

        loop {
            let token = self.lexer.next_token()?;
            match token {
                Token::Stream => return self.parse_stream_data(dict).map(Object::Stream),
                Token::Comment(_) => continue,
                _ => {
                    self.lexer.push_token(token);
                    return Ok(Object::Dictionary(dict));
                }
            }
        }
    }

    fn parse_dictionary_inner(&mut self) -> ParseResult<Dictionary> {
        let mut dict = Dictionary::new();

        loop {
            let token = self.lexer.next_token()?;
            match token {
                Token::DictEnd => break,
                Token::Comment(_) => continue,
                Token::Name(key) => {
                    let value = self.parse_object()?;
                    // A null value is equivalent to an absent entry
                    if !value.is_null() {
                        dict.set(key, value);
                    }
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "dictionary key (name) or >>".to_string(),
                        found: format!("{token:?}"),
                    });
                }
            }
        }

        Ok(dict)
    }

    fn parse_stream_data(&mut self, dict: Dictionary) -> ParseResult<Stream> {
        self.lexer.skip_stream_eol();
        let start = self.lexer.position();
        let data = self.lexer.data();

        let declared = match dict.get("Length") {
            Some(Object::Integer(len)) if *len >= 0 => Some(*len as usize),
            Some(Object::Reference(id)) => self.lengths.resolve_length(*id),
            _ => None,
        };

        if let Some(length) = declared.filter(|len| length_is_plausible(data, start, *len)) {
            let bytes = self.lexer.read_bytes(length)?.to_vec();
            match self.lexer.next_token()? {
                Token::EndStream => return Ok(Stream::new(dict, bytes)),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "endstream".to_string(),
                        found: format!("{other:?}"),
                    })
                }
            }
        }

        tracing::debug!(
            "stream at offset {} has unusable /Length, scanning for endstream",
            start
        );
        let end = find_from(data, start, b"endstream").ok_or_else(|| ParseError::SyntaxError {
            position: start,
            message: "Stream is not terminated by endstream".to_string(),
        })?;

        let mut data_end = end;
        if data_end > start && data[data_end - 1] == b'\n' {
            data_end -= 1;
        }
        if data_end > start && data[data_end - 1] == b'\r' {
            data_end -= 1;
        }

        let bytes = data[start..data_end].to_vec();
        self.lexer.set_position(end + b"endstream".len());
        Ok(Stream::new(dict, bytes))
    }
}

/// True when `endstream` follows `start + length`, allowing intervening whitespace.
fn length_is_plausible(data: &[u8], start: usize, length: usize) -> bool {
    let Some(mut end) = start.checked_add(length) else {
        return false;
    };
    if end > data.len() {
        return false;
    }
    while end < data.len() && is_whitespace(data[end]) {
        end += 1;
    }
    data[end..].starts_with(b"endstream")
}

fn object_id(number: i64, generation: i64, position: usize) -> ParseResult<ObjectId> {
    let number = u32::try_from(number).map_err(|_| ParseError::SyntaxError {
        position,
        message: format!("Invalid object number: {number}"),
    })?;
    let generation = u16::try_from(generation).map_err(|_| ParseError::SyntaxError {
        position,
        message: format!("Invalid generation number: {generation}"),
    })?;
    Ok(ObjectId::new(number, generation))
}
