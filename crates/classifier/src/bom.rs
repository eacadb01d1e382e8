//! Signature and validation based detection.
//!
//! Order of checks:
//! 1. byte-order mark (any BOM means text)
//! 2. strict UTF-8 validation with a NUL-density cap
//! 3. printable-byte heuristic with a cap on bytes >= 0x80

use crate::FileClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bom {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

pub fn detect_bom(prefix: &[u8]) -> Option<Bom> {
    match prefix {
        [0xEF, 0xBB, 0xBF, ..] => Some(Bom::Utf8),
        [0xFF, 0xFE, 0x00, 0x00, ..] => Some(Bom::Utf32Le),
        [0xFF, 0xFE, ..] => Some(Bom::Utf16Le),
        [0xFE, 0xFF, ..] => Some(Bom::Utf16Be),
        [0x00, 0x00, 0xFE, 0xFF, ..] => Some(Bom::Utf32Be),
        _ => None,
    }
}

pub(crate) fn classify(prefix: &[u8]) -> FileClass {
    if detect_bom(prefix).is_some() || is_valid_utf8(prefix) || looks_like_text(prefix) {
        FileClass::Text
    } else {
        FileClass::Binary
    }
}

/// Strict UTF-8 check. A sequence cut off by the end of the buffer counts as
/// invalid, and so does a buffer that is more than 20% NUL.
pub fn is_valid_utf8(buf: &[u8]) -> bool {
    let mut nul_count = 0usize;
    let mut i = 0;

    while i < buf.len() {
        let lead = buf[i];
        let (width, min, initial) = match lead {
            0x00 => {
                nul_count += 1;
                i += 1;
                continue;
            }
            0x01..=0x7F => {
                i += 1;
                continue;
            }
            _ if lead & 0b1110_0000 == 0b1100_0000 => (2, 0x80, u32::from(lead & 0b0001_1111)),
            _ if lead & 0b1111_0000 == 0b1110_0000 => (3, 0x800, u32::from(lead & 0b0000_1111)),
            _ if lead & 0b1111_1000 == 0b1111_0000 => {
                (4, 0x1_0000, u32::from(lead & 0b0000_0111))
            }
            _ => return false,
        };

        let Some(tail) = buf.get(i + 1..i + width) else {
            return false;
        };
        let mut codepoint = initial;
        for &byte in tail {
            if byte & 0b1100_0000 != 0b1000_0000 {
                return false;
            }
            codepoint = (codepoint << 6) | u32::from(byte & 0b0011_1111);
        }

        if codepoint < min {
            return false;
        }
        if width == 3 && (0xD800..=0xDFFF).contains(&codepoint) {
            return false;
        }
        if codepoint > 0x10_FFFF {
            return false;
        }
        i += width;
    }

    nul_count * 5 <= buf.len()
}

/// Every byte must be TAB/LF/CR, printable ASCII or >= 0x80; at most 10% may
/// be >= 0x80.
fn looks_like_text(buf: &[u8]) -> bool {
    let mut high = 0usize;
    for &byte in buf {
        match byte {
            b'\t' | b'\n' | b'\r' | 0x20..=0x7E => {}
            0x80..=0xFF => high += 1,
            _ => return false,
        }
    }
    high * 10 <= buf.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn recognises_every_bom() {
        assert_eq!(detect_bom(&[0xEF, 0xBB, 0xBF, b'h']), Some(Bom::Utf8));
        assert_eq!(detect_bom(&[0xFF, 0xFE, b'h', 0x00]), Some(Bom::Utf16Le));
        assert_eq!(detect_bom(&[0xFF, 0xFE]), Some(Bom::Utf16Le));
        assert_eq!(detect_bom(&[0xFF, 0xFE, 0x00, 0x00]), Some(Bom::Utf32Le));
        assert_eq!(detect_bom(&[0xFE, 0xFF, 0x00, b'h']), Some(Bom::Utf16Be));
        assert_eq!(detect_bom(&[0x00, 0x00, 0xFE, 0xFF]), Some(Bom::Utf32Be));
        assert_eq!(detect_bom(&[0x00, 0x00, 0xFE]), None);
        assert_eq!(detect_bom(b"plain"), None);
    }

    #[test]
    fn bom_prefixed_content_is_text() {
        assert_eq!(
            classify(&[0xEF, 0xBB, 0xBF, 0x68, 0x65, 0x6C, 0x6C, 0x6F]),
            FileClass::Text
        );
        let mut utf16 = vec![0xFF, 0xFE];
        utf16.extend("wide text".encode_utf16().flat_map(u16::to_le_bytes));
        assert_eq!(classify(&utf16), FileClass::Text);
    }

    #[test]
    fn nul_heavy_prefix_is_binary() {
        assert_eq!(
            classify(&[0x00, 0x00, 0x00, 0x01, 0x02, 0x03]),
            FileClass::Binary
        );
    }

    #[test]
    fn multibyte_utf8_is_text() {
        let mut bytes = vec![0xE2, 0x82, 0xAC];
        bytes.extend_from_slice(b" costs extra");
        assert_eq!(classify(&bytes), FileClass::Text);
        assert!(is_valid_utf8("ünïcødé 😀".as_bytes()));
    }

    #[test]
    fn lone_continuation_byte_is_binary() {
        assert!(!is_valid_utf8(&[0x80]));
        assert_eq!(classify(&[0x80]), FileClass::Binary);
        assert_eq!(classify(&[0x80, b'a', b'b']), FileClass::Binary);
    }

    #[test]
    fn utf8_validation_rejects_malformed_sequences() {
        // truncated at the buffer boundary
        assert!(!is_valid_utf8(&[b'a', 0xE2, 0x82]));
        // overlong encodings
        assert!(!is_valid_utf8(&[0xC0, 0xAF]));
        assert!(!is_valid_utf8(&[0xE0, 0x80, 0xAF]));
        assert!(!is_valid_utf8(&[0xF0, 0x80, 0x80, 0xAF]));
        // surrogate U+D800
        assert!(!is_valid_utf8(&[0xED, 0xA0, 0x80]));
        // above U+10FFFF
        assert!(!is_valid_utf8(&[0xF4, 0x90, 0x80, 0x80]));
        // bad continuation
        assert!(!is_valid_utf8(&[0xC3, 0x28]));
        // invalid lead byte
        assert!(!is_valid_utf8(&[0xF8, 0x88, 0x80, 0x80, 0x80]));
    }

    #[test]
    fn nul_density_cap_is_twenty_percent() {
        assert!(is_valid_utf8(b"abcd\0"));
        assert!(!is_valid_utf8(b"abc\0\0"));
    }

    #[test]
    fn latin1_text_falls_back_to_heuristic() {
        // 'é' in Latin-1 is not valid UTF-8, but one high byte in a long line is fine.
        let latin1 = b"caf\xE9 au lait, s'il vous pla\xEEt";
        assert!(!is_valid_utf8(latin1));
        assert_eq!(classify(latin1), FileClass::Text);

        let dense = [0xE9u8, b'a', 0xE9, b'b', 0xE9];
        assert_eq!(classify(&dense), FileClass::Binary);
    }

    proptest! {
        #[test]
        fn every_rust_string_without_nul_is_valid(text in "[^\u{0}]{0,64}") {
            prop_assert!(is_valid_utf8(text.as_bytes()));
            prop_assert_eq!(classify(text.as_bytes()), FileClass::Text);
        }
    }
}
