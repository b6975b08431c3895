//! PDF Stream Filters
//!
//! Decoding of the stream filters found in form templates (ISO 32000-1 Section 7.4).
//! Image codecs are never decoded: those streams are copied through untouched.

use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Filters this module can undo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Filter {
    ASCIIHexDecode,
    ASCII85Decode,
    FlateDecode,
}

impl Filter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCIIHexDecode" | "AHx" => Some(Filter::ASCIIHexDecode),
            "ASCII85Decode" | "A85" => Some(Filter::ASCII85Decode),
            "FlateDecode" | "Fl" => Some(Filter::FlateDecode),
            _ => None,
        }
    }
}

/// Decode stream data according to the `/Filter` and `/DecodeParms` entries
pub fn decode_stream(data: &[u8], dict: &Dictionary) -> ParseResult<Vec<u8>> {
    let filters: Vec<&str> = match dict.get("Filter") {
        Some(Object::Name(name)) => vec![name.as_str()],
        Some(Object::Array(array)) => array
            .iter()
            .map(|obj| {
                obj.as_name().ok_or_else(|| {
                    ParseError::StreamDecodeError("Invalid filter in array".to_string())
                })
            })
            .collect::<ParseResult<_>>()?,
        None => return Ok(data.to_vec()),
        Some(other) => {
            return Err(ParseError::StreamDecodeError(format!(
                "Invalid Filter type: {}",
                other.type_name()
            )))
        }
    };

    let params: Vec<Option<&Dictionary>> = match dict.get("DecodeParms") {
        Some(Object::Dictionary(params)) => vec![Some(params)],
        Some(Object::Array(array)) => array.iter().map(Object::as_dict).collect(),
        _ => Vec::new(),
    };

    let mut result = data.to_vec();
    for (index, filter_name) in filters.into_iter().enumerate() {
        let filter = Filter::from_name(filter_name).ok_or_else(|| {
            ParseError::StreamDecodeError(format!("Unsupported filter: {filter_name}"))
        })?;
        result = apply_filter(&result, filter)?;

        if let Some(params) = params.get(index).copied().flatten() {
            result = apply_predictor(result, params)?;
        }
    }

    Ok(result)
}

fn apply_filter(data: &[u8], filter: Filter) -> ParseResult<Vec<u8>> {
    match filter {
        Filter::FlateDecode => decode_flate(data),
        Filter::ASCIIHexDecode => decode_ascii_hex(data),
        Filter::ASCII85Decode => decode_ascii85(data),
    }
}

/// Decode FlateDecode (zlib/deflate) compressed data
fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut result = Vec::new();
    decoder
        .read_to_end(&mut result)
        .map_err(|e| ParseError::StreamDecodeError(format!("Flate decode error: {e}")))?;
    Ok(result)
}

/// Undo the `/Predictor` transform applied before compression.
///
/// Only PNG predictors (10..=15) appear in cross-reference and object
/// streams; TIFF predictor 2 is accepted for 8-bit components.
fn apply_predictor(data: Vec<u8>, params: &Dictionary) -> ParseResult<Vec<u8>> {
    let predictor = params.get_integer("Predictor").unwrap_or(1);
    let colors = params.get_integer("Colors").unwrap_or(1).max(1) as usize;
    let bits = params.get_integer("BitsPerComponent").unwrap_or(8).max(1) as usize;
    let columns = params.get_integer("Columns").unwrap_or(1).max(1) as usize;

    let bytes_per_pixel = (colors * bits).div_ceil(8);
    let row_length = (colors * bits * columns).div_ceil(8);

    match predictor {
        1 => Ok(data),
        2 if bits == 8 => Ok(undo_tiff_predictor(data, bytes_per_pixel, row_length)),
        10..=15 => undo_png_predictor(&data, bytes_per_pixel, row_length),
        other => Err(ParseError::StreamDecodeError(format!(
            "Unsupported predictor: {other}"
        ))),
    }
}

fn undo_tiff_predictor(mut data: Vec<u8>, bpp: usize, row_length: usize) -> Vec<u8> {
    for row in data.chunks_mut(row_length) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

fn undo_png_predictor(data: &[u8], bpp: usize, row_length: usize) -> ParseResult<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_length];

    for encoded in data.chunks(row_length + 1) {
        let (&kind, row) = encoded
            .split_first()
            .ok_or_else(|| ParseError::StreamDecodeError("Empty predictor row".to_string()))?;
        let mut current = row.to_vec();
        current.resize(row_length, 0);

        for i in 0..row_length {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };

            current[i] = match kind {
                0 => current[i],
                1 => current[i].wrapping_add(left),
                2 => current[i].wrapping_add(up),
                3 => current[i].wrapping_add(((u16::from(left) + u16::from(up)) / 2) as u8),
                4 => current[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(ParseError::StreamDecodeError(format!(
                        "Invalid PNG predictor type: {other}"
                    )))
                }
            };
        }

        result.extend_from_slice(&current[..row.len().min(row_length)]);
        previous = current;
    }

    Ok(result)
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let p = i16::from(left) + i16::from(up) - i16::from(up_left);
    let pa = (p - i16::from(left)).abs();
    let pb = (p - i16::from(up)).abs();
    let pc = (p - i16::from(up_left)).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}

/// Decode ASCIIHexDecode data
fn decode_ascii_hex(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut digits = Vec::new();
    for &ch in data.iter().filter(|b| !b.is_ascii_whitespace()) {
        if ch == b'>' {
            break;
        }
        digits.push(hex_digit_value(ch).ok_or_else(|| {
            ParseError::StreamDecodeError(format!("Invalid hex digit: {}", ch as char))
        })?);
    }

    // Odd number of digits: pad with 0
    if digits.len() % 2 != 0 {
        digits.push(0);
    }

    Ok(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}

fn hex_digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Decode ASCII85Decode data
fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut body: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if body.starts_with(b"<~") {
        body.drain(..2);
    }
    if let Some(end) = body.windows(2).position(|w| w == b"~>") {
        body.truncate(end);
    }

    let mut result = Vec::new();
    let mut group = Vec::with_capacity(5);

    for &c in &body {
        match c {
            b'z' if group.is_empty() => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group.push(c);
                if group.len() == 5 {
                    result.extend_from_slice(&ascii85_group(&group)?);
                    group.clear();
                }
            }
            _ => {
                return Err(ParseError::StreamDecodeError(format!(
                    "Invalid ASCII85 character: {}",
                    c as char
                )))
            }
        }
    }

    // A final partial group of n characters encodes n - 1 bytes
    if !group.is_empty() {
        let encoded = group.len();
        if encoded == 1 {
            return Err(ParseError::StreamDecodeError(
                "Truncated ASCII85 group".to_string(),
            ));
        }
        group.resize(5, b'u');
        let bytes = ascii85_group(&group)?;
        result.extend_from_slice(&bytes[..encoded - 1]);
    }

    Ok(result)
}

fn ascii85_group(group: &[u8]) -> ParseResult<[u8; 4]> {
    let value = group
        .iter()
        .fold(0u64, |acc, &ch| acc * 85 + u64::from(ch - b'!'));
    let value = u32::try_from(value)
        .map_err(|_| ParseError::StreamDecodeError("ASCII85 group overflow".to_string()))?;
    Ok(value.to_be_bytes())
}
