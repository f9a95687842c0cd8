//! Property-based tests for the decoder
//!
//! A test-local canonical encoder generates well-formed inputs; the
//! properties verify:
//! - Roundtrip: canonical encodings decode to the source tree
//! - Totality on truncation: every strict prefix of a valid encoding fails,
//!   and fails with `Truncated`
//! - Indefinite-length markers are always rejected

use cbor_core::{decode, DecodeError, Value};
use proptest::prelude::*;

/// Canonical header: minimal-length argument encoding
fn put_header(out: &mut Vec<u8>, major: u8, arg: u64) {
    match arg {
        0..=23 => out.push(major << 5 | arg as u8),
        24..=0xff => {
            out.push(major << 5 | 24);
            out.push(arg as u8);
        }
        0x100..=0xffff => {
            out.push(major << 5 | 25);
            out.extend_from_slice(&(arg as u16).to_be_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(major << 5 | 26);
            out.extend_from_slice(&(arg as u32).to_be_bytes());
        }
        _ => {
            out.push(major << 5 | 27);
            out.extend_from_slice(&arg.to_be_bytes());
        }
    }
}

/// Canonical encoder mirroring what the producing system emits
fn encode(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::UInt(n) => put_header(out, 0, *n),
        Value::NegInt(n) => put_header(out, 1, *n),
        Value::Bytes(b) => {
            put_header(out, 2, b.len() as u64);
            out.extend_from_slice(b);
        }
        Value::Text(s) => {
            put_header(out, 3, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            put_header(out, 4, items.len() as u64);
            for item in items {
                encode(item, out);
            }
        }
        Value::Map(entries) => {
            put_header(out, 5, entries.len() as u64);
            for (key, val) in entries {
                encode(key, out);
                encode(val, out);
            }
        }
        Value::Tag(tag, inner) => {
            put_header(out, 6, *tag);
            encode(inner, out);
        }
        Value::Bool(false) => out.push(0xf4),
        Value::Bool(true) => out.push(0xf5),
        Value::Null => out.push(0xf6),
        Value::Float(f) => {
            out.push(0xfb);
            out.extend_from_slice(&f.to_bits().to_be_bytes());
        }
    }
}

/// Strategy for scalar values (floats excluded; bit-exact equality of
/// generated floats is covered by deterministic vectors instead)
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<u64>().prop_map(Value::UInt),
        any::<u64>().prop_map(Value::NegInt),
        prop::collection::vec(any::<u8>(), 0..48).prop_map(Value::Bytes),
        "[a-z0-9 ]{0,24}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Strategy for value trees a few levels deep
fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((inner.clone(), inner.clone()), 0..4).prop_map(Value::Map),
            (0u64..1000, inner).prop_map(|(tag, v)| Value::Tag(tag, Box::new(v))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: canonical encodings decode back to the source tree
    #[test]
    fn prop_roundtrip(value in value_strategy()) {
        let mut buf = Vec::new();
        encode(&value, &mut buf);
        prop_assert_eq!(decode(&buf).unwrap(), value);
    }

    /// Property: every strict prefix of a valid encoding is truncated
    #[test]
    fn prop_prefix_is_truncated(value in value_strategy(), cut in 0usize..64) {
        let mut buf = Vec::new();
        encode(&value, &mut buf);
        prop_assume!(!buf.is_empty());

        let cut = cut % buf.len();
        let result = decode(&buf[..cut]);
        prop_assert!(
            matches!(result, Err(DecodeError::Truncated { .. })),
            "prefix of length {} decoded to {:?}", cut, result
        );
    }

    /// Property: appending any byte to a valid encoding leaves a remainder
    #[test]
    fn prop_trailing_byte_rejected(value in value_strategy(), extra in any::<u8>()) {
        let mut buf = Vec::new();
        encode(&value, &mut buf);
        buf.push(extra);
        prop_assert_eq!(decode(&buf), Err(DecodeError::TrailingBytes { remaining: 1 }));
    }

    /// Property: indefinite-length markers fail for every major type
    #[test]
    fn prop_indefinite_rejected(major in 0u8..8) {
        let result = decode(&[major << 5 | 31]);
        let is_reserved = matches!(result, Err(DecodeError::ReservedEncoding { offset: 0 }));
        prop_assert!(is_reserved, "unexpected result: {:?}", result);
    }
}
