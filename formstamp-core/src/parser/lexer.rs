//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2

use super::{ParseError, ParseResult};

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal)
    String(Vec<u8>),

    /// Name object (e.g., /Type), `#xx` escapes already decoded
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Stream keyword
    Stream,

    /// Endstream keyword
    EndStream,

    /// Obj keyword
    Obj,

    /// Endobj keyword
    EndObj,

    /// StartXRef keyword
    StartXRef,

    /// Xref keyword
    XRef,

    /// Trailer keyword
    Trailer,

    /// Reference marker R
    R,

    /// Null object
    Null,

    /// Comment (usually ignored)
    Comment(String),

    /// Any other bare word
    Keyword(String),

    /// End of file
    Eof,
}

/// PDF Lexer over an in-memory byte buffer
pub struct Lexer<'a> {
    data: &'a [u8],
    position: usize,
    token_buffer: Vec<Token>,
}

pub(crate) fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub(crate) fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

impl<'a> Lexer<'a> {
    /// Create a new lexer positioned at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self::new_at(data, 0)
    }

    /// Create a new lexer positioned at `position`
    pub fn new_at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position: position.min(data.len()),
            token_buffer: Vec::new(),
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Current byte offset. Pushed-back tokens are not accounted for.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move to `position`, discarding any pushed-back tokens
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
        self.token_buffer.clear();
    }

    /// Push a token back; tokens are returned in LIFO order
    pub fn push_token(&mut self, token: Token) {
        self.token_buffer.push(token);
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ParseResult<Token> {
        if let Some(token) = self.token_buffer.pop() {
            return Ok(token);
        }

        self.skip_whitespace();

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'%' => Ok(self.read_comment()),
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => self.read_angle_bracket(),
            b'>' => {
                self.consume_char();
                if self.peek_char() == Some(b'>') {
                    self.consume_char();
                    Ok(Token::DictEnd)
                } else {
                    Err(self.syntax_error("Expected '>' after '>'"))
                }
            }
            b'[' => {
                self.consume_char();
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.consume_char();
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'0'..=b'9' | b'.' => self.read_number(),
            _ if ch.is_ascii_alphabetic() => Ok(self.read_keyword()),
            _ => Err(self.syntax_error(format!("Unexpected character: {}", ch as char))),
        }
    }

    fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::SyntaxError {
            position: self.position,
            message: message.into(),
        }
    }

    fn peek_char(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn consume_char(&mut self) -> Option<u8> {
        let ch = self.peek_char();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Skip whitespace and return the number of bytes skipped
    pub(crate) fn skip_whitespace(&mut self) -> usize {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if !is_whitespace(ch) {
                break;
            }
            self.position += 1;
        }
        self.position - start
    }

    fn read_comment(&mut self) -> Token {
        self.consume_char(); // consume '%'
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if ch == b'\n' || ch == b'\r' {
                break;
            }
            self.position += 1;
        }
        Token::Comment(String::from_utf8_lossy(&self.data[start..self.position]).into_owned())
    }

    fn read_name(&mut self) -> ParseResult<Token> {
        self.consume_char(); // consume '/'
        let mut name = String::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.consume_char();

            // /A#20B means /A B
            if ch == b'#' {
                let hex = self
                    .data
                    .get(self.position..self.position + 2)
                    .ok_or_else(|| self.syntax_error("Incomplete hex code in name"))?;
                let value = std::str::from_utf8(hex)
                    .ok()
                    .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                    .ok_or_else(|| self.syntax_error("Invalid hex code in name"))?;
                self.position += 2;
                name.push(value as char);
            } else {
                name.push(ch as char);
            }
        }

        Ok(Token::Name(name))
    }

    fn read_literal_string(&mut self) -> ParseResult<Token> {
        self.consume_char(); // consume '('
        let mut string = Vec::new();
        let mut paren_depth = 1;

        while paren_depth > 0 {
            let ch = self
                .consume_char()
                .ok_or_else(|| self.syntax_error("Unterminated string"))?;

            match ch {
                b'\\' => {
                    let escaped = self
                        .consume_char()
                        .ok_or_else(|| self.syntax_error("Unterminated string"))?;
                    match escaped {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(b'\x08'),
                        b'f' => string.push(b'\x0C'),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek_char() {
                                    Some(next @ b'0'..=b'7') => {
                                        self.consume_char();
                                        value = value * 8 + u32::from(next - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            string.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.peek_char() == Some(b'\n') {
                                self.consume_char();
                            }
                        }
                        b'\n' => {}
                        other => string.push(other),
                    }
                }
                b'(' => {
                    string.push(ch);
                    paren_depth += 1;
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth > 0 {
                        string.push(ch);
                    }
                }
                _ => string.push(ch),
            }
        }

        Ok(Token::String(string))
    }

    /// Hex strings or dictionary start
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        self.consume_char(); // consume '<'

        if self.peek_char() == Some(b'<') {
            self.consume_char();
            return Ok(Token::DictStart);
        }

        let mut digits = Vec::new();
        loop {
            let ch = self
                .consume_char()
                .ok_or_else(|| self.syntax_error("Unterminated hex string"))?;
            match ch {
                b'>' => break,
                _ if ch.is_ascii_hexdigit() => digits.push(ch),
                _ if is_whitespace(ch) => {}
                _ => return Err(self.syntax_error("Invalid character in hex string")),
            }
        }

        // Odd digit count: the missing final digit is 0
        if digits.len() % 2 != 0 {
            digits.push(b'0');
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| (hex_value(pair[0]) << 4) | hex_value(pair[1]))
            .collect();

        Ok(Token::String(bytes))
    }

    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let mut has_dot = false;
        let mut has_digit = false;

        if matches!(self.peek_char(), Some(b'+' | b'-')) {
            self.consume_char();
        }

        while let Some(ch) = self.peek_char() {
            match ch {
                b'0'..=b'9' => {
                    has_digit = true;
                    self.consume_char();
                }
                b'.' if !has_dot => {
                    has_dot = true;
                    self.consume_char();
                }
                _ => break,
            }
        }

        if !has_digit {
            return Err(self.syntax_error("Expected digit in number"));
        }

        let text = std::str::from_utf8(&self.data[start..self.position])
            .map_err(|_| self.syntax_error("Invalid number"))?;

        if has_dot {
            let value = text
                .parse::<f64>()
                .map_err(|_| self.syntax_error(format!("Invalid real number: '{text}'")))?;
            Ok(Token::Real(value))
        } else {
            let value = text
                .parse::<i64>()
                .map_err(|_| self.syntax_error(format!("Invalid integer: '{text}'")))?;
            Ok(Token::Integer(value))
        }
    }

    fn read_keyword(&mut self) -> Token {
        let word = self.read_word();
        match word.as_str() {
            "true" => Token::Boolean(true),
            "false" => Token::Boolean(false),
            "null" => Token::Null,
            "stream" => Token::Stream,
            "endstream" => Token::EndStream,
            "obj" => Token::Obj,
            "endobj" => Token::EndObj,
            "startxref" => Token::StartXRef,
            "xref" => Token::XRef,
            "trailer" => Token::Trailer,
            "R" => Token::R,
            _ => Token::Keyword(word),
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.position += 1;
        }
        String::from_utf8_lossy(&self.data[start..self.position]).into_owned()
    }

    /// Consume the end-of-line marker that follows the `stream` keyword
    pub fn skip_stream_eol(&mut self) {
        match self.peek_char() {
            Some(b'\r') => {
                self.consume_char();
                if self.peek_char() == Some(b'\n') {
                    self.consume_char();
                }
            }
            Some(b'\n') => {
                self.consume_char();
            }
            _ => {}
        }
    }

    /// Read exactly `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.syntax_error(format!("Expected {n} bytes, found end of file")))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Offset of the next occurrence of `pattern` at or after the current position
    pub fn find_sequence(&self, pattern: &[u8]) -> Option<usize> {
        find_from(self.data, self.position, pattern)
    }
}

pub(crate) fn find_from(data: &[u8], from: usize, pattern: &[u8]) -> Option<usize> {
    if pattern.is_empty() || from >= data.len() {
        return None;
    }
    data[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}
