//! UTF-7 (RFC 2152).
//!
//! Decoding accepts the full grammar. Encoding writes every directly
//! encodable character (set D and set O) verbatim and closes each base64
//! shift sequence with an explicit `-`.

use crate::error::EncodingError;

const NAME: &str = "UTF-7";
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

pub(crate) fn decode(bytes: &[u8]) -> Result<String, EncodingError> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'+' {
            if !byte.is_ascii() {
                return Err(EncodingError::malformed(
                    NAME,
                    format!("non-ASCII byte 0x{byte:02X} at offset {i}"),
                ));
            }
            units.push(u16::from(byte));
            i += 1;
            continue;
        }

        i += 1;
        if bytes.get(i) == Some(&b'-') {
            units.push(u16::from(b'+'));
            i += 1;
            continue;
        }

        let mut bits: u32 = 0;
        let mut nbits = 0u32;
        while let Some(sextet) = bytes.get(i).and_then(|&b| base64_value(b)) {
            bits = (bits << 6) | u32::from(sextet);
            nbits += 6;
            if nbits >= 16 {
                nbits -= 16;
                units.push((bits >> nbits) as u16);
                bits &= (1 << nbits) - 1;
            }
            i += 1;
        }
        // '-' terminates the shift and is absorbed
        if bytes.get(i) == Some(&b'-') {
            i += 1;
        }
    }

    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|err| EncodingError::malformed(NAME, err.to_string()))
}

pub(crate) fn encode(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut pending: Vec<u16> = Vec::new();
    let mut buf = [0u16; 2];

    for ch in text.chars() {
        if ch == '+' {
            flush_shift(&mut out, &mut pending);
            out.extend_from_slice(b"+-");
        } else if is_direct(ch) {
            flush_shift(&mut out, &mut pending);
            out.push(ch as u8);
        } else {
            pending.extend_from_slice(ch.encode_utf16(&mut buf));
        }
    }
    flush_shift(&mut out, &mut pending);
    out
}

fn flush_shift(out: &mut Vec<u8>, units: &mut Vec<u16>) {
    if units.is_empty() {
        return;
    }

    out.push(b'+');
    let mut bits: u32 = 0;
    let mut nbits = 0u32;
    for &unit in units.iter() {
        bits = (bits << 16) | u32::from(unit);
        nbits += 16;
        while nbits >= 6 {
            nbits -= 6;
            out.push(ALPHABET[((bits >> nbits) & 0x3f) as usize]);
        }
        bits &= (1 << nbits) - 1;
    }
    if nbits > 0 {
        out.push(ALPHABET[((bits << (6 - nbits)) & 0x3f) as usize]);
    }
    out.push(b'-');
    units.clear();
}

fn base64_value(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Set D, set O and the whitespace RFC 2152 allows unshifted
fn is_direct(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '\'' | '(' | ')' | ',' | '-' | '.' | '/' | ':' | '?' | ' ' | '\t' | '\r' | '\n'
        )
        || matches!(
            ch,
            '!' | '"'
                | '#'
                | '$'
                | '%'
                | '&'
                | '*'
                | ';'
                | '<'
                | '='
                | '>'
                | '@'
                | '['
                | ']'
                | '^'
                | '_'
                | '`'
                | '{'
                | '|'
                | '}'
        )
}
