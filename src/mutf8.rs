//! Modified UTF-8, the string encoding used for names and string payloads.
//!
//! It differs from standard UTF-8 in two ways: NUL is written as the two bytes
//! `C0 80`, and characters outside the Basic Multilingual Plane are written as a
//! UTF-16 surrogate pair with each half encoded as a three-byte sequence. Text
//! without either feature is byte-identical to UTF-8, which both directions use
//! as a fast path.

use std::borrow::Cow;

/// Encodes `s` as modified UTF-8.
pub fn encode(s: &str) -> Cow<'_, [u8]> {
    if !s.bytes().any(|b| b == 0 || b >= 0xF0) {
        return Cow::Borrowed(s.as_bytes());
    }
    let mut out = Vec::with_capacity(s.len() + 8);
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    Cow::Owned(out)
}

/// Decodes modified UTF-8 bytes.
///
/// Only the canonical form is accepted: a raw `0x00` byte and overlong
/// sequences other than `C0 80` are rejected, so re-encoding the result
/// reproduces the input.
///
/// On failure, returns the index of the offending byte with a short reason.
pub fn decode(bytes: &[u8]) -> Result<String, (usize, &'static str)> {
    if !bytes.iter().any(|&b| b == 0 || b >= 0xF0) {
        if let Ok(s) = std::str::from_utf8(bytes) {
            return Ok(s.to_string());
        }
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = u16::from(bytes[i]);
        match a >> 4 {
            0x0..=0x7 => {
                if a == 0 {
                    return Err((i, "raw NUL byte"));
                }
                units.push(a);
                i += 1;
            }
            0xC | 0xD => {
                let b = continuation(bytes, i + 1)?;
                let unit = ((a & 0x1F) << 6) | b;
                if unit != 0 && unit < 0x80 {
                    return Err((i, "overlong two-byte sequence"));
                }
                units.push(unit);
                i += 2;
            }
            0xE => {
                let b = continuation(bytes, i + 1)?;
                let c = continuation(bytes, i + 2)?;
                let unit = ((a & 0x0F) << 12) | (b << 6) | c;
                if unit < 0x800 {
                    return Err((i, "overlong three-byte sequence"));
                }
                units.push(unit);
                i += 3;
            }
            _ => return Err((i, "invalid lead byte")),
        }
    }
    String::from_utf16(&units).map_err(|_| (bytes.len(), "unpaired surrogate"))
}

fn continuation(bytes: &[u8], i: usize) -> Result<u16, (usize, &'static str)> {
    match bytes.get(i) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        Some(_) => Err((i, "invalid continuation byte")),
        None => Err((i, "truncated multi-byte sequence")),
    }
}
