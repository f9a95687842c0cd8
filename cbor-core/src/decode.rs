//! Header and item decoding
//!
//! Each item starts with an initial byte: major type in the 3 high bits,
//! additional info in the 5 low bits. Info 0-23 is the inline argument;
//! 24/25/26/27 select a 1/2/4/8-byte big-endian extension. The producing
//! system emits only canonical encodings, so non-minimal extensions are
//! rejected, as are the reserved info values 28-30 and the indefinite-length
//! marker 31.

use crate::{Cursor, DecodeError, Result, Value};

/// Major type: unsigned integer
pub const MAJOR_UINT: u8 = 0;
/// Major type: negative integer
pub const MAJOR_NEGINT: u8 = 1;
/// Major type: byte string
pub const MAJOR_BYTES: u8 = 2;
/// Major type: text string
pub const MAJOR_TEXT: u8 = 3;
/// Major type: array
pub const MAJOR_ARRAY: u8 = 4;
/// Major type: map
pub const MAJOR_MAP: u8 = 5;
/// Major type: tagged value
pub const MAJOR_TAG: u8 = 6;
/// Major type: simple values and floats
pub const MAJOR_SPECIAL: u8 = 7;

/// Maximum nesting depth accepted from untrusted input
pub const MAX_DEPTH: usize = 64;

/// Decoded initial byte with its fully resolved argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Major type (0..=7)
    pub major: u8,
    /// Raw additional-info bits, needed to tell float widths apart
    pub info: u8,
    /// Argument: value for integers, length for strings and containers,
    /// tag number for tags, raw bits for floats
    pub arg: u64,
}

/// Read one item header
///
/// Enforces canonical minimal-length arguments for every major type except
/// the special category, whose extension bytes carry float payloads rather
/// than lengths.
pub fn read_header(cur: &mut Cursor<'_>) -> Result<Header> {
    let offset = cur.position();
    let initial = cur.read_u8()?;
    let major = initial >> 5;
    let info = initial & 0x1f;

    let arg = match info {
        0..=23 => u64::from(info),
        24 => {
            let v = u64::from(cur.read_u8()?);
            if major != MAJOR_SPECIAL && v < 24 {
                return Err(DecodeError::MalformedLength {
                    offset,
                    reason: "1-byte argument under 24",
                });
            }
            v
        }
        25 => {
            let b = cur.read_exact(2)?;
            let v = u64::from(u16::from_be_bytes([b[0], b[1]]));
            if major != MAJOR_SPECIAL && v < 0x100 {
                return Err(DecodeError::MalformedLength {
                    offset,
                    reason: "2-byte argument under 256",
                });
            }
            v
        }
        26 => {
            let b = cur.read_exact(4)?;
            let v = u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]]));
            if major != MAJOR_SPECIAL && v < 0x1_0000 {
                return Err(DecodeError::MalformedLength {
                    offset,
                    reason: "4-byte argument under 65536",
                });
            }
            v
        }
        27 => {
            let b = cur.read_exact(8)?;
            let v = u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]);
            if major != MAJOR_SPECIAL && v < 0x1_0000_0000 {
                return Err(DecodeError::MalformedLength {
                    offset,
                    reason: "8-byte argument under 2^32",
                });
            }
            v
        }
        // 28-30 reserved, 31 indefinite length
        _ => return Err(DecodeError::ReservedEncoding { offset }),
    };

    Ok(Header { major, info, arg })
}

/// Read an unsigned integer item
pub fn read_u64(cur: &mut Cursor<'_>) -> Result<u64> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_UINT {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "unsigned integer",
            found: h.major,
        });
    }
    Ok(h.arg)
}

/// Read a signed integer item (unsigned or negative major type)
pub fn read_i64(cur: &mut Cursor<'_>) -> Result<i64> {
    let offset = cur.position();
    let h = read_header(cur)?;
    match h.major {
        MAJOR_UINT => i64::try_from(h.arg).map_err(|_| DecodeError::MalformedLength {
            offset,
            reason: "integer out of i64 range",
        }),
        MAJOR_NEGINT => {
            let n = i64::try_from(h.arg).map_err(|_| DecodeError::MalformedLength {
                offset,
                reason: "integer out of i64 range",
            })?;
            n.checked_neg()
                .and_then(|v| v.checked_sub(1))
                .ok_or(DecodeError::MalformedLength {
                    offset,
                    reason: "integer out of i64 range",
                })
        }
        _ => Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "integer",
            found: h.major,
        }),
    }
}

/// Read a byte string item, returning an owned copy
pub fn read_bytes(cur: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_BYTES {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "byte string",
            found: h.major,
        });
    }
    let len = arg_to_len(h.arg, offset)?;
    Ok(cur.read_exact(len)?.to_vec())
}

/// Read a text string item, validating UTF-8
pub fn read_text(cur: &mut Cursor<'_>) -> Result<String> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_TEXT {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "text string",
            found: h.major,
        });
    }
    let len = arg_to_len(h.arg, offset)?;
    let bytes = cur.read_exact(len)?.to_vec();
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 { offset })
}

/// Read an array header, returning the element count
pub fn read_array_header(cur: &mut Cursor<'_>) -> Result<u64> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_ARRAY {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "array",
            found: h.major,
        });
    }
    Ok(h.arg)
}

/// Read a map header, returning the entry count
pub fn read_map_header(cur: &mut Cursor<'_>) -> Result<u64> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_MAP {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "map",
            found: h.major,
        });
    }
    Ok(h.arg)
}

/// Read a tag header, returning the tag number
pub fn read_tag(cur: &mut Cursor<'_>) -> Result<u64> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_TAG {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "tag",
            found: h.major,
        });
    }
    Ok(h.arg)
}

/// Read a boolean item
pub fn read_bool(cur: &mut Cursor<'_>) -> Result<bool> {
    let offset = cur.position();
    let h = read_header(cur)?;
    if h.major != MAJOR_SPECIAL {
        return Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "boolean",
            found: h.major,
        });
    }
    match h.info {
        20 => Ok(false),
        21 => Ok(true),
        _ => Err(DecodeError::UnsupportedMajorType {
            offset,
            expected: "boolean",
            found: h.major,
        }),
    }
}

/// Read one complete value tree
pub fn read_value(cur: &mut Cursor<'_>) -> Result<Value> {
    read_value_at(cur, 0)
}

/// Decode a buffer as a single value, requiring full consumption
pub fn decode(buf: &[u8]) -> Result<Value> {
    let mut cur = Cursor::new(buf);
    let value = read_value(&mut cur)?;
    if !cur.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: cur.remaining(),
        });
    }
    Ok(value)
}

fn read_value_at(cur: &mut Cursor<'_>, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(DecodeError::NestingTooDeep { limit: MAX_DEPTH });
    }

    let offset = cur.position();
    let h = read_header(cur)?;
    match h.major {
        MAJOR_UINT => Ok(Value::UInt(h.arg)),
        MAJOR_NEGINT => Ok(Value::NegInt(h.arg)),
        MAJOR_BYTES => {
            let len = arg_to_len(h.arg, offset)?;
            Ok(Value::Bytes(cur.read_exact(len)?.to_vec()))
        }
        MAJOR_TEXT => {
            let len = arg_to_len(h.arg, offset)?;
            let bytes = cur.read_exact(len)?.to_vec();
            String::from_utf8(bytes)
                .map(Value::Text)
                .map_err(|_| DecodeError::InvalidUtf8 { offset })
        }
        MAJOR_ARRAY => {
            // Each element takes at least one byte, so a count beyond the
            // remaining input can never decode.
            if h.arg > cur.remaining() as u64 {
                return Err(DecodeError::Truncated { offset });
            }
            let mut items = Vec::with_capacity(h.arg as usize);
            for _ in 0..h.arg {
                items.push(read_value_at(cur, depth + 1)?);
            }
            Ok(Value::Array(items))
        }
        MAJOR_MAP => {
            if h.arg.saturating_mul(2) > cur.remaining() as u64 {
                return Err(DecodeError::Truncated { offset });
            }
            let mut entries = Vec::with_capacity(h.arg as usize);
            for _ in 0..h.arg {
                let key = read_value_at(cur, depth + 1)?;
                let value = read_value_at(cur, depth + 1)?;
                entries.push((key, value));
            }
            Ok(Value::Map(entries))
        }
        MAJOR_TAG => Ok(Value::Tag(h.arg, Box::new(read_value_at(cur, depth + 1)?))),
        _ => match h.info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            25 => Ok(Value::Float(f16_to_f64(h.arg as u16))),
            26 => Ok(Value::Float(f64::from(f32::from_bits(h.arg as u32)))),
            27 => Ok(Value::Float(f64::from_bits(h.arg))),
            _ => Err(DecodeError::ReservedEncoding { offset }),
        },
    }
}

fn arg_to_len(arg: u64, offset: usize) -> Result<usize> {
    usize::try_from(arg).map_err(|_| DecodeError::Truncated { offset })
}

/// Widen an IEEE 754 half-precision value to f64
fn f16_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = (bits >> 10) & 0x1f;
    let frac = bits & 0x03ff;
    let magnitude = match exp {
        0 => f64::from(frac) * 2f64.powi(-24),
        0x1f => {
            if frac == 0 {
                f64::INFINITY
            } else {
                f64::NAN
            }
        }
        _ => (1.0 + f64::from(frac) / 1024.0) * 2f64.powi(i32::from(exp) - 15),
    };
    sign * magnitude
}
