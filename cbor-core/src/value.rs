//! Decoded item tree

/// A decoded wire item
///
/// Generic, type-erased tree handed to schema validation. Byte and text
/// payloads are owned copies detached from the input buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Unsigned integer (major type 0)
    UInt(u64),

    /// Negative integer (major type 1), stored as the raw argument `n` and
    /// denoting the value `-1 - n`
    NegInt(u64),

    /// Byte string (major type 2)
    Bytes(Vec<u8>),

    /// Text string (major type 3)
    Text(String),

    /// Array (major type 4)
    Array(Vec<Value>),

    /// Map as key/value pairs in encoded order (major type 5)
    Map(Vec<(Value, Value)>),

    /// Tagged value (major type 6)
    Tag(u64, Box<Value>),

    /// Boolean (simple values 20/21)
    Bool(bool),

    /// Null (simple value 22)
    Null,

    /// Floating point, half and single precision widened to f64
    Float(f64),
}

impl Value {
    /// Signed reading of integer items; `None` for non-integers
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::UInt(n) => Some(i128::from(*n)),
            Value::NegInt(n) => Some(-1 - i128::from(*n)),
            _ => None,
        }
    }
}
