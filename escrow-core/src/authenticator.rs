//! Deal notification authentication
//!
//! Turns a raw `handle_filecoin_method` payload into a [`DealProposal`]
//! trusted to describe the agreed deal. The payload arrives from outside the
//! trust boundary; everything about it is checked before any field is used.

use crate::proposal::DealProposal;
use crate::types::Address;
use crate::{Error, Result};
use cbor_core::{decode, Cursor, DecodeError, PieceCid};
use tracing::debug;

/// Method selector of the deal-published notification (FRC-42 hash of
/// `PieceStorageDeal`-style method dispatch)
pub const DEAL_PUBLISHED_METHOD_NUM: u64 = 2_643_134_072;

/// IPLD codec identifier for CBOR params
pub const CBOR_CODEC: u64 = 0x51;

/// Validates deal notifications against the agreed terms
///
/// Holds only immutable expectations; the authenticator itself has no state
/// to corrupt, so a failed call can be retried with a corrected payload.
#[derive(Debug, Clone)]
pub struct MessageAuthenticator {
    /// The only identity allowed to deliver notifications
    trusted_source: Address,

    /// Piece identifier the published deal must carry
    agreed_piece: PieceCid,

    /// Provider actor the published deal must name
    registered_provider: Address,

    /// Label the published deal must carry
    expected_label: String,
}

impl MessageAuthenticator {
    /// Build an authenticator for one deal's expectations
    pub fn new(
        trusted_source: Address,
        agreed_piece: PieceCid,
        registered_provider: Address,
        expected_label: String,
    ) -> Self {
        Self {
            trusted_source,
            agreed_piece,
            registered_provider,
            expected_label,
        }
    }

    /// The only identity allowed to deliver notifications
    pub fn trusted_source(&self) -> &Address {
        &self.trusted_source
    }

    /// Authenticate a notification and return the embedded proposal
    ///
    /// Checks, in order: the params codec, the method selector, the caller
    /// identity, payload decodability, and finally the proposal fields
    /// against the agreed terms. Any failure rejects the whole notification.
    pub fn authenticate(
        &self,
        method_number: u64,
        codec: u64,
        payload: &[u8],
        caller: &Address,
    ) -> Result<DealProposal> {
        if codec != CBOR_CODEC {
            return Err(Error::UnsupportedCodec(codec));
        }
        if method_number != DEAL_PUBLISHED_METHOD_NUM {
            return Err(Error::UnsupportedMethod(method_number));
        }
        if caller != &self.trusted_source {
            return Err(Error::Unauthorized("notification from untrusted source"));
        }

        let proposal = decode_notification(payload)?;
        debug!(
            provider = %proposal.provider,
            label = %proposal.label,
            piece_size = proposal.piece_size,
            "decoded deal notification"
        );

        if proposal.piece_cid != self.agreed_piece {
            return Err(Error::DealMismatch { field: "piece_cid" });
        }
        if proposal.provider != self.registered_provider {
            return Err(Error::DealMismatch { field: "provider" });
        }
        if proposal.label != self.expected_label {
            return Err(Error::DealMismatch { field: "label" });
        }
        Ok(proposal)
    }
}

/// Decode the notification envelope: a two-element array holding the client
/// signature bytes (unused here) and the serialized proposal
fn decode_notification(payload: &[u8]) -> Result<DealProposal> {
    let mut cur = Cursor::new(payload);
    let offset = cur.position();
    let arity = decode::read_array_header(&mut cur)?;
    if arity != 2 {
        return Err(Error::Decode(DecodeError::MalformedLength {
            offset,
            reason: "notification envelope is not a 2-element array",
        }));
    }
    let _signature = decode::read_bytes(&mut cur)?;
    let proposal_bytes = decode::read_bytes(&mut cur)?;
    if !cur.is_empty() {
        return Err(Error::Decode(DecodeError::TrailingBytes {
            remaining: cur.remaining(),
        }));
    }
    Ok(DealProposal::decode(&proposal_bytes)?)
}
