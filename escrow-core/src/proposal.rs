//! Published deal proposal
//!
//! The storage market serializes a proposal as a canonical CBOR array of
//! eleven fields in fixed order. Decoding is strict: wrong arity, wrong
//! field types, or leftover bytes all fail.

use crate::types::{Address, ChainEpoch, TokenAmount};
use cbor_core::{decode, ids, Cursor, DecodeError, PieceCid};

/// Field count of the serialized proposal array
const PROPOSAL_FIELDS: u64 = 11;

/// A storage deal proposal as published on chain
#[derive(Debug, Clone, PartialEq)]
pub struct DealProposal {
    /// Content identifier of the stored piece
    pub piece_cid: PieceCid,

    /// Padded piece size in bytes
    pub piece_size: u64,

    /// True when the deal uses verified datacap
    pub verified_deal: bool,

    /// Client actor address
    pub client: Address,

    /// Provider actor address
    pub provider: Address,

    /// Arbitrary deal label
    pub label: String,

    /// First epoch of the storage term
    pub start_epoch: ChainEpoch,

    /// Last epoch of the storage term
    pub end_epoch: ChainEpoch,

    /// Price paid per epoch of storage
    pub storage_price_per_epoch: TokenAmount,

    /// Collateral posted by the provider
    pub provider_collateral: TokenAmount,

    /// Collateral posted by the client
    pub client_collateral: TokenAmount,
}

impl DealProposal {
    /// Decode a serialized proposal, requiring full consumption of `buf`
    pub fn decode(buf: &[u8]) -> cbor_core::Result<Self> {
        let mut cur = Cursor::new(buf);
        let proposal = Self::read(&mut cur)?;
        if !cur.is_empty() {
            return Err(DecodeError::TrailingBytes {
                remaining: cur.remaining(),
            });
        }
        Ok(proposal)
    }

    /// Read a proposal from the cursor's current position
    pub fn read(cur: &mut Cursor<'_>) -> cbor_core::Result<Self> {
        let offset = cur.position();
        let arity = decode::read_array_header(cur)?;
        if arity != PROPOSAL_FIELDS {
            return Err(DecodeError::MalformedLength {
                offset,
                reason: "proposal array is not 11 fields",
            });
        }
        Ok(Self {
            piece_cid: ids::read_piece_cid(cur)?,
            piece_size: decode::read_u64(cur)?,
            verified_deal: decode::read_bool(cur)?,
            client: Address::new(ids::read_actor_address(cur)?),
            provider: Address::new(ids::read_actor_address(cur)?),
            label: decode::read_text(cur)?,
            start_epoch: decode::read_i64(cur)?,
            end_epoch: decode::read_i64(cur)?,
            storage_price_per_epoch: TokenAmount::new(ids::read_token_amount(cur)?),
            provider_collateral: TokenAmount::new(ids::read_token_amount(cur)?),
            client_collateral: TokenAmount::new(ids::read_token_amount(cur)?),
        })
    }

    /// Length of the storage term in epochs; zero when the schedule is
    /// inverted, saturating on extreme epochs
    pub fn duration(&self) -> ChainEpoch {
        self.end_epoch.saturating_sub(self.start_epoch).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Serialized proposal taken from a captured deal-published notification
    const PROPOSAL_HEX: &str = "8bd82a5828000181e2039220206b86b273ff34fce19d6b804eff5a3f5747ada4eaa22f1d49c01e52ddb7875b4b190800f4420068420066656c6162656c0a1a0008ca0a42000a42000a42000a";

    #[test]
    fn test_decode_captured_proposal() {
        let buf = hex::decode(PROPOSAL_HEX).unwrap();
        let proposal = DealProposal::decode(&buf).unwrap();

        assert_eq!(proposal.piece_size, 2048);
        assert!(!proposal.verified_deal);
        assert_eq!(proposal.client.as_bytes(), &[0x00, 0x68]);
        assert_eq!(proposal.provider.as_bytes(), &[0x00, 0x66]);
        assert_eq!(proposal.label, "label");
        assert_eq!(proposal.start_epoch, 10);
        assert_eq!(proposal.end_epoch, 576_010);
        assert_eq!(proposal.duration(), 576_000);
        assert_eq!(proposal.storage_price_per_epoch, TokenAmount::new(10));
        assert_eq!(proposal.provider_collateral, TokenAmount::new(10));
        assert_eq!(proposal.client_collateral, TokenAmount::new(10));
    }

    #[test]
    fn test_decode_rejects_wrong_arity() {
        let mut buf = hex::decode(PROPOSAL_HEX).unwrap();
        // 10-field array header
        buf[0] = 0x8a;
        assert!(matches!(
            DealProposal::decode(&buf),
            Err(DecodeError::MalformedLength { offset: 0, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_trailing_bytes() {
        let mut buf = hex::decode(PROPOSAL_HEX).unwrap();
        buf.push(0x00);
        assert_eq!(
            DealProposal::decode(&buf),
            Err(DecodeError::TrailingBytes { remaining: 1 })
        );
    }

    #[test]
    fn test_decode_rejects_truncation() {
        let buf = hex::decode(PROPOSAL_HEX).unwrap();
        for len in 0..buf.len() {
            assert!(DealProposal::decode(&buf[..len]).is_err());
        }
    }

    #[test]
    fn test_duration_saturates_on_extreme_epochs() {
        let buf = hex::decode(PROPOSAL_HEX).unwrap();
        let mut proposal = DealProposal::decode(&buf).unwrap();

        // The wire format admits the full i64 epoch range
        proposal.start_epoch = i64::MIN;
        proposal.end_epoch = i64::MAX;
        assert_eq!(proposal.duration(), i64::MAX);

        proposal.start_epoch = i64::MAX;
        proposal.end_epoch = i64::MIN;
        assert_eq!(proposal.duration(), 0);

        // Inverted schedule clamps to zero
        proposal.start_epoch = 100;
        proposal.end_epoch = 10;
        assert_eq!(proposal.duration(), 0);
    }

    #[test]
    fn test_decode_rejects_field_type_swap() {
        let mut buf = hex::decode(PROPOSAL_HEX).unwrap();
        // Turn the verified_deal boolean (f4) into null (f6)
        let pos = buf.iter().position(|&b| b == 0xf4).unwrap();
        buf[pos] = 0xf6;
        assert!(DealProposal::decode(&buf).is_err());
    }
}
