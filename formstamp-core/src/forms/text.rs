//! PDF text strings (ISO 32000-1 Section 7.9.2.2)
//!
//! Text strings are stored either in PDFDocEncoding or as UTF-16BE
//! prefixed with the byte order mark `FE FF`.

const UTF16_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// PDFDocEncoding bytes whose character differs from Latin-1
const PDF_DOC_SPECIALS: &[(u8, char)] = &[
    (0x18, '\u{02D8}'), // Breve
    (0x19, '\u{02C7}'), // Caron
    (0x1A, '\u{02C6}'), // Modifier circumflex
    (0x1B, '\u{02D9}'), // Dot above
    (0x1C, '\u{02DD}'), // Double acute accent
    (0x1D, '\u{02DB}'), // Ogonek
    (0x1E, '\u{02DA}'), // Ring above
    (0x1F, '\u{02DC}'), // Small tilde
    (0x80, '\u{2022}'), // Bullet
    (0x81, '\u{2020}'), // Dagger
    (0x82, '\u{2021}'), // Double dagger
    (0x83, '\u{2026}'), // Horizontal ellipsis
    (0x84, '\u{2014}'), // Em dash
    (0x85, '\u{2013}'), // En dash
    (0x86, '\u{0192}'), // Latin small letter f with hook
    (0x87, '\u{2044}'), // Fraction slash
    (0x88, '\u{2039}'), // Single left angle quotation mark
    (0x89, '\u{203A}'), // Single right angle quotation mark
    (0x8A, '\u{2212}'), // Minus sign
    (0x8B, '\u{2030}'), // Per mille sign
    (0x8C, '\u{201E}'), // Double low quotation mark
    (0x8D, '\u{201C}'), // Left double quotation mark
    (0x8E, '\u{201D}'), // Right double quotation mark
    (0x8F, '\u{2018}'), // Left single quotation mark
    (0x90, '\u{2019}'), // Right single quotation mark
    (0x91, '\u{201A}'), // Single low quotation mark
    (0x92, '\u{2122}'), // Trade mark sign
    (0x93, '\u{FB01}'), // Ligature fi
    (0x94, '\u{FB02}'), // Ligature fl
    (0x95, '\u{0141}'), // Latin capital letter L with stroke
    (0x96, '\u{0152}'), // Latin capital ligature OE
    (0x97, '\u{0160}'), // Latin capital letter S with caron
    (0x98, '\u{0178}'), // Latin capital letter Y with diaeresis
    (0x99, '\u{017D}'), // Latin capital letter Z with caron
    (0x9A, '\u{0131}'), // Latin small letter dotless i
    (0x9B, '\u{0142}'), // Latin small letter l with stroke
    (0x9C, '\u{0153}'), // Latin small ligature oe
    (0x9D, '\u{0161}'), // Latin small letter s with caron
    (0x9E, '\u{017E}'), // Latin small letter z with caron
    (0xA0, '\u{20AC}'), // Euro sign
];

/// PDFDocEncoding byte for `ch`, if the character is representable
fn pdf_doc_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        0x09 | 0x0A | 0x0D | 0x20..=0x7E => Some(ch as u8),
        0xA1..=0xFF if ch as u32 != 0xAD => Some(ch as u8),
        _ => PDF_DOC_SPECIALS
            .iter()
            .find(|(_, special)| *special == ch)
            .map(|(byte, _)| *byte),
    }
}

fn pdf_doc_char(byte: u8) -> char {
    match byte {
        0x18..=0x1F | 0x80..=0xA0 => PDF_DOC_SPECIALS
            .iter()
            .find(|(b, _)| *b == byte)
            .map_or('\u{FFFD}', |(_, ch)| *ch),
        0x7F | 0xAD => '\u{FFFD}',
        _ => byte as char,
    }
}

/// Encode `text` as PDFDocEncoding when possible, otherwise as UTF-16BE with BOM
pub fn encode_text_string(text: &str) -> Vec<u8> {
    let pdf_doc: Option<Vec<u8>> = text.chars().map(pdf_doc_byte).collect();
    match pdf_doc {
        // A leading "þÿ" or "ï»¿" would read back as a byte order mark
        Some(bytes) if !bytes.starts_with(&UTF16_BOM) && !bytes.starts_with(&UTF8_BOM) => bytes,
        _ => {
            let mut bytes = Vec::with_capacity(2 + text.len() * 2);
            bytes.extend_from_slice(&UTF16_BOM);
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            bytes
        }
    }
}

/// Decode a text string in any of the encodings PDF allows
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&UTF16_BOM) {
        let units: Vec<u16> = utf16
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair.get(1).copied().unwrap_or(0)]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&UTF8_BOM) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}
