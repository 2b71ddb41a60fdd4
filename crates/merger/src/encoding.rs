//! Byte-order-mark detection and byte-exact text codecs.
//!
//! The encoding detected on read is the one used on write, so text that is
//! not touched by a rename comes back out as the same bytes.

mod utf7;

use crate::error::EncodingError;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text encoding of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// `2B 2F 76`
    Utf7,
    /// `EF BB BF`
    Utf8Bom,
    /// `FF FE 00 00`
    Utf32Le,
    /// `FF FE`
    Utf16Le,
    /// `FE FF`
    Utf16Be,
    /// `00 00 FE FF`
    Utf32Be,
    /// No signature, valid UTF-8 (includes plain ASCII)
    Utf8,
    /// No signature, not UTF-8: windows-1252, one char per byte
    SingleByte,
}

/// Signatures in detection order. UTF-32LE must precede UTF-16LE.
const SIGNATURES: &[(&[u8], TextEncoding)] = &[
    (&[0x2B, 0x2F, 0x76], TextEncoding::Utf7),
    (&[0xEF, 0xBB, 0xBF], TextEncoding::Utf8Bom),
    (&[0xFF, 0xFE, 0x00, 0x00], TextEncoding::Utf32Le),
    (&[0xFF, 0xFE], TextEncoding::Utf16Le),
    (&[0xFE, 0xFF], TextEncoding::Utf16Be),
    (&[0x00, 0x00, 0xFE, 0xFF], TextEncoding::Utf32Be),
];

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf7 => "UTF-7",
            Self::Utf8Bom => "UTF-8 (BOM)",
            Self::Utf32Le => "UTF-32LE",
            Self::Utf16Le => "UTF-16LE",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf32Be => "UTF-32BE",
            Self::Utf8 => "UTF-8",
            Self::SingleByte => "windows-1252",
        }
    }

    /// Signature bytes written ahead of the body.
    ///
    /// UTF-7 has none here: its mark is an encoded U+FEFF that shares a shift
    /// sequence with the text after it.
    fn signature(self) -> &'static [u8] {
        match self {
            Self::Utf8Bom => &[0xEF, 0xBB, 0xBF],
            Self::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            Self::Utf16Le => &[0xFF, 0xFE],
            Self::Utf16Be => &[0xFE, 0xFF],
            Self::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
            Self::Utf7 | Self::Utf8 | Self::SingleByte => &[],
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding announced by a byte-order mark, if any
pub fn detect_bom(bytes: &[u8]) -> Option<TextEncoding> {
    SIGNATURES
        .iter()
        .find(|(signature, _)| bytes.starts_with(signature))
        .map(|&(_, encoding)| encoding)
}

/// Byte-order mark if present, otherwise the ASCII-compatible default
pub fn detect(bytes: &[u8]) -> TextEncoding {
    detect_bom(bytes).unwrap_or_else(|| {
        if Encoding::utf8_valid_up_to(bytes) == bytes.len() {
            TextEncoding::Utf8
        } else {
            TextEncoding::SingleByte
        }
    })
}

/// File content as text, minus its byte-order mark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub encoding: TextEncoding,
    pub text: String,
}

impl DecodedText {
    /// Encode `text` the way this content was encoded
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, EncodingError> {
        encode(self.encoding, text)
    }
}

/// Detect and decode
pub fn decode(bytes: &[u8]) -> Result<DecodedText, EncodingError> {
    let encoding = detect(bytes);
    let body = &bytes[encoding.signature().len()..];

    let text = match encoding {
        TextEncoding::Utf7 => {
            let text = utf7::decode(body)?;
            match text.strip_prefix('\u{feff}') {
                Some(rest) => rest.to_string(),
                None => text,
            }
        }
        TextEncoding::Utf8 | TextEncoding::Utf8Bom => strict(UTF_8, body)?,
        TextEncoding::Utf16Le => strict(UTF_16LE, body)?,
        TextEncoding::Utf16Be => strict(UTF_16BE, body)?,
        TextEncoding::Utf32Le => decode_utf32(body, u32::from_le_bytes, encoding)?,
        TextEncoding::Utf32Be => decode_utf32(body, u32::from_be_bytes, encoding)?,
        TextEncoding::SingleByte => WINDOWS_1252.decode_without_bom_handling(body).0.into_owned(),
    };

    Ok(DecodedText { encoding, text })
}

/// Signature followed by `text` in `encoding`
pub fn encode(encoding: TextEncoding, text: &str) -> Result<Vec<u8>, EncodingError> {
    let mut out = encoding.signature().to_vec();

    match encoding {
        TextEncoding::Utf7 => {
            let mut marked = String::with_capacity(text.len() + 3);
            marked.push('\u{feff}');
            marked.push_str(text);
            out.extend(utf7::encode(&marked));
        }
        TextEncoding::Utf8 | TextEncoding::Utf8Bom => out.extend_from_slice(text.as_bytes()),
        TextEncoding::Utf16Le => out.extend(text.encode_utf16().flat_map(u16::to_le_bytes)),
        TextEncoding::Utf16Be => out.extend(text.encode_utf16().flat_map(u16::to_be_bytes)),
        TextEncoding::Utf32Le => out.extend(text.chars().flat_map(|ch| u32::from(ch).to_le_bytes())),
        TextEncoding::Utf32Be => out.extend(text.chars().flat_map(|ch| u32::from(ch).to_be_bytes())),
        TextEncoding::SingleByte => {
            let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
            if unmappable {
                let ch = first_unmappable(text).unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(EncodingError::Unmappable {
                    encoding: encoding.name(),
                    ch,
                });
            }
            out.extend_from_slice(&bytes);
        }
    }

    Ok(out)
}

fn strict(codec: &'static Encoding, body: &[u8]) -> Result<String, EncodingError> {
    codec
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| EncodingError::malformed(codec.name(), "invalid byte sequence"))
}

fn decode_utf32(
    body: &[u8],
    unit: fn([u8; 4]) -> u32,
    encoding: TextEncoding,
) -> Result<String, EncodingError> {
    if body.len() % 4 != 0 {
        return Err(EncodingError::malformed(
            encoding.name(),
            format!("length {} is not a multiple of 4", body.len()),
        ));
    }

    body.chunks_exact(4)
        .map(|chunk| {
            let value = unit([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(value).ok_or_else(|| {
                EncodingError::malformed(encoding.name(), format!("invalid scalar 0x{value:X}"))
            })
        })
        .collect()
}

fn first_unmappable(text: &str) -> Option<char> {
    let mut buf = [0u8; 4];
    text.chars()
        .find(|ch| WINDOWS_1252.encode(ch.encode_utf8(&mut buf)).2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detects_every_signature() {
        assert_eq!(detect_bom(b"+/v8-abc"), Some(TextEncoding::Utf7));
        assert_eq!(detect_bom(b"\xEF\xBB\xBFabc"), Some(TextEncoding::Utf8Bom));
        assert_eq!(detect_bom(b"\xFF\xFE\x00\x00a\x00\x00\x00"), Some(TextEncoding::Utf32Le));
        assert_eq!(detect_bom(b"\xFF\xFEa\x00"), Some(TextEncoding::Utf16Le));
        assert_eq!(detect_bom(b"\xFE\xFF\x00a"), Some(TextEncoding::Utf16Be));
        assert_eq!(detect_bom(b"\x00\x00\xFE\xFF\x00\x00\x00a"), Some(TextEncoding::Utf32Be));
        assert_eq!(detect_bom(b"using System;"), None);
    }

    #[test]
    fn short_files_use_prefix_matching() {
        assert_eq!(detect_bom(b"\xFF\xFE"), Some(TextEncoding::Utf16Le));
        assert_eq!(detect_bom(b"\xEF\xBB"), None);
        assert_eq!(detect_bom(b""), None);
    }

    #[test]
    fn unsigned_content_defaults_to_ascii_compatible() {
        assert_eq!(detect(b"plain ascii"), TextEncoding::Utf8);
        assert_eq!(detect("caf\u{e9}".as_bytes()), TextEncoding::Utf8);
        assert_eq!(detect(b"caf\xE9"), TextEncoding::SingleByte);
    }

    #[test]
    fn round_trips_are_byte_identical() {
        let samples: Vec<Vec<u8>> = vec![
            b"var x = Resources.Title;".to_vec(),
            b"\xEF\xBB\xBFvar x = 1;\r\n".to_vec(),
            b"\xFF\xFEa\x00b\x00".to_vec(),
            b"\xFE\xFF\x00a\x00b".to_vec(),
            b"\xFF\xFE\x00\x00a\x00\x00\x00".to_vec(),
            b"\x00\x00\xFE\xFF\x00\x00\x00a".to_vec(),
            b"+/v8-x = y;".to_vec(),
            b"na\xEFve \x81\x8D\x90 bytes".to_vec(),
        ];

        for bytes in samples {
            let decoded = decode(&bytes).unwrap();
            assert_eq!(
                decoded.encode(&decoded.text).unwrap(),
                bytes,
                "{}",
                decoded.encoding
            );
        }
    }

    #[test]
    fn decodes_without_signature_characters() {
        let decoded = decode(b"\xFF\xFEh\x00i\x00").unwrap();
        assert_eq!(decoded.encoding, TextEncoding::Utf16Le);
        assert_eq!(decoded.text, "hi");

        let decoded = decode(b"+/v8-hi").unwrap();
        assert_eq!(decoded.text, "hi");
    }

    #[test]
    fn malformed_content_is_rejected() {
        assert!(decode(b"\xEF\xBB\xBF\xC3").is_err());
        assert!(decode(b"\xFF\xFEa").is_err());
        assert!(decode(b"\xFF\xFE\x00\x00a\x00\x00").is_err());
        assert!(decode(b"\x00\x00\xFE\xFF\x00\x11\x00\x00").is_err());
    }

    #[test]
    fn single_byte_rejects_unmappable_text() {
        let err = encode(TextEncoding::SingleByte, "\u{4E2D}").unwrap_err();
        assert_eq!(
            err,
            EncodingError::Unmappable {
                encoding: "windows-1252",
                ch: '\u{4E2D}'
            }
        );
    }
}
