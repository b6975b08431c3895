//! PDF Object Stream Parser
//!
//! Handles compressed objects stored in object streams (PDF 1.5+)

use super::lexer::{Lexer, Token};
use super::objects::ObjectParser;
use super::{ParseError, ParseResult};
use crate::objects::{Object, Stream};

/// Objects extracted from one `/Type /ObjStm` stream, in stream order
#[derive(Debug)]
pub struct ObjectStream {
    objects: Vec<(u32, Object)>,
}

impl ObjectStream {
    /// Decode the stream and parse every object it holds
    pub fn parse(stream: &Stream) -> ParseResult<Self> {
        let dict = stream.dictionary();

        let n = dict
            .get_integer("N")
            .filter(|n| *n >= 0)
            .ok_or_else(|| ParseError::MissingKey("N".to_string()))? as usize;
        let first = dict
            .get_integer("First")
            .filter(|first| *first >= 0)
            .ok_or_else(|| ParseError::MissingKey("First".to_string()))? as usize;

        let data = super::filters::decode_stream(stream.data(), dict)?;

        // Header: N pairs of object number and relative offset
        let mut lexer = Lexer::new(&data);
        let mut header = Vec::with_capacity(n);
        for _ in 0..n {
            let number = Self::expect_integer(&mut lexer, "object number in object stream")?;
            let offset = Self::expect_integer(&mut lexer, "offset in object stream")?;
            header.push((number, offset));
        }

        let mut objects = Vec::with_capacity(n);
        for (number, offset) in header {
            let number = u32::try_from(number).map_err(|_| ParseError::SyntaxError {
                position: 0,
                message: format!("Invalid object number in object stream: {number}"),
            })?;
            let position = first + offset.max(0) as usize;
            if position > data.len() {
                return Err(ParseError::SyntaxError {
                    position,
                    message: format!("Object {number} lies outside its object stream"),
                });
            }

            let object = ObjectParser::new(&data, position).parse_object()?;
            objects.push((number, object));
        }

        Ok(Self { objects })
    }

    fn expect_integer(lexer: &mut Lexer<'_>, what: &str) -> ParseResult<i64> {
        match lexer.next_token()? {
            Token::Integer(value) => Ok(value),
            other => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    /// Object at `index` in the stream, checked against the expected number
    pub fn get_by_index(&self, index: u32, number: u32) -> Option<&Object> {
        self.objects
            .get(index as usize)
            .filter(|(found, _)| *found == number)
            .map(|(_, object)| object)
            .or_else(|| self.get_object(number))
    }

    pub fn get_object(&self, number: u32) -> Option<&Object> {
        self.objects
            .iter()
            .find(|(found, _)| *found == number)
            .map(|(_, object)| object)
    }

    pub fn objects(&self) -> impl Iterator<Item = (u32, &Object)> {
        self.objects.iter().map(|(number, object)| (*number, object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
