//! Control-byte scan.
//!
//! Fast, but wide encodings (UTF-16/UTF-32) are full of NUL bytes and come out
//! as binary. Use the BOM-based strategy when those matter.

use crate::FileClass;

pub(crate) fn classify(prefix: &[u8]) -> FileClass {
    if prefix.iter().copied().any(is_forbidden) {
        FileClass::Binary
    } else {
        FileClass::Text
    }
}

fn is_forbidden(byte: u8) -> bool {
    byte < 0x20 && !matches!(byte, b'\t' | b'\n' | b'\r')
}
