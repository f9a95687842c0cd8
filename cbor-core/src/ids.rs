//! Domain identifier readers
//!
//! Content identifiers, actor identities, and big-integer token amounts as
//! the storage network encodes them inside deal notifications. Built on the
//! generic primitives in [`crate::decode`]; no deal semantics.

use crate::{decode, Cursor, DecodeError, Result};
use std::fmt;

/// Tag number marking a content identifier
pub const CID_TAG: u64 = 42;

/// Fixed CID header for piece commitments: identity multibase, CIDv1,
/// fil-commitment-unsealed multicodec, sha2-256-trunc254-padded multihash,
/// 32-byte digest length
pub const PIECE_CID_PREFIX: [u8; 8] = [0x00, 0x01, 0x81, 0xE2, 0x03, 0x92, 0x20, 0x20];

/// Digest length of a piece commitment
pub const PIECE_DIGEST_LEN: usize = 32;

/// Content-addressed piece identifier
///
/// Stores the 32-byte digest; the fixed header is implied and re-attached by
/// [`PieceCid::to_bytes`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceCid([u8; PIECE_DIGEST_LEN]);

impl PieceCid {
    /// Build from the full CID bytes (fixed header plus digest)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PIECE_CID_PREFIX.len() + PIECE_DIGEST_LEN {
            return Err(DecodeError::InvalidCid("wrong length"));
        }
        if bytes[..PIECE_CID_PREFIX.len()] != PIECE_CID_PREFIX {
            return Err(DecodeError::InvalidCid(
                "header does not match the piece commitment prefix",
            ));
        }
        let mut digest = [0u8; PIECE_DIGEST_LEN];
        digest.copy_from_slice(&bytes[PIECE_CID_PREFIX.len()..]);
        Ok(Self(digest))
    }

    /// Parse from hex of the full CID bytes, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x"))
            .map_err(|_| DecodeError::InvalidCid("not valid hex"))?;
        Self::from_bytes(&bytes)
    }

    /// The 32-byte digest
    pub fn digest(&self) -> &[u8; PIECE_DIGEST_LEN] {
        &self.0
    }

    /// Full CID bytes (fixed header plus digest)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(PIECE_CID_PREFIX.len() + PIECE_DIGEST_LEN);
        out.extend_from_slice(&PIECE_CID_PREFIX);
        out.extend_from_slice(&self.0);
        out
    }
}

impl fmt::Display for PieceCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for PieceCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PieceCid({self})")
    }
}

/// Read a tagged content identifier: tag 42 followed by the CID byte string,
/// validated against the fixed piece commitment prefix
pub fn read_piece_cid(cur: &mut Cursor<'_>) -> Result<PieceCid> {
    let tag = decode::read_tag(cur)?;
    if tag != CID_TAG {
        return Err(DecodeError::InvalidCid("missing tag 42"));
    }
    let bytes = decode::read_bytes(cur)?;
    PieceCid::from_bytes(&bytes)
}

/// Read an actor identity: a byte string whose first byte is the address
/// protocol id
pub fn read_actor_address(cur: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let bytes = decode::read_bytes(cur)?;
    if bytes.is_empty() {
        return Err(DecodeError::InvalidAddress("empty byte string"));
    }
    Ok(bytes)
}

/// Read a token amount: a byte string holding a sign byte followed by a
/// big-endian magnitude
///
/// An empty string means zero. Amounts inside deal notifications are never
/// negative, so only the positive sign byte `0x00` is accepted, and the
/// magnitude must fit 128 bits.
pub fn read_token_amount(cur: &mut Cursor<'_>) -> Result<u128> {
    let offset = cur.position();
    let bytes = decode::read_bytes(cur)?;
    if bytes.is_empty() {
        return Ok(0);
    }
    if bytes[0] != 0x00 {
        return Err(DecodeError::MalformedLength {
            offset,
            reason: "negative or unknown sign byte in token amount",
        });
    }
    let magnitude = &bytes[1..];
    if magnitude.len() > 16 {
        return Err(DecodeError::MalformedLength {
            offset,
            reason: "token amount magnitude exceeds 128 bits",
        });
    }
    let mut value: u128 = 0;
    for &b in magnitude {
        value = (value << 8) | u128::from(b);
    }
    Ok(value)
}
