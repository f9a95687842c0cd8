//! Dealbridge CBOR decoder
//!
//! Generic decoder for the compact, self-describing binary format carried by
//! deal notifications, operating over untrusted input.
//!
//! # Architecture
//!
//! - **Explicit cursor**: every read threads a [`Cursor`] and advances it; no
//!   read silently succeeds past the buffer end
//! - **Fixed-length only**: indefinite-length items are rejected, the
//!   producing system emits canonical fixed-length encodings
//! - **Owned output**: decoded byte/text payloads are independent copies,
//!   never aliases into the input buffer
//! - **All-or-nothing**: any failure aborts the whole decode with a typed
//!   [`DecodeError`]; there is no partial result

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod cursor;
pub mod decode;
pub mod error;
pub mod ids;
pub mod value;

// Re-exports
pub use cursor::Cursor;
pub use decode::{decode, read_value, Header, MAX_DEPTH};
pub use error::{DecodeError, Result};
pub use ids::{PieceCid, CID_TAG, PIECE_CID_PREFIX, PIECE_DIGEST_LEN};
pub use value::Value;
