//! Core types for the escrow engine
//!
//! All fund amounts use checked integer arithmetic; nothing here panics on
//! untrusted input.

use cbor_core::PieceCid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chain epoch number; deal schedules may reference negative sentinels
pub type ChainEpoch = i64;

/// Token amount in the chain's smallest unit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    /// The zero amount
    pub const ZERO: TokenAmount = TokenAmount(0);

    /// Create from a raw unit count
    pub const fn new(units: u128) -> Self {
        Self(units)
    }

    /// Raw unit count
    pub const fn units(&self) -> u128 {
        self.0
    }

    /// True for the zero amount
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_add(other.0).map(TokenAmount)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: TokenAmount) -> Option<TokenAmount> {
        self.0.checked_sub(other.0).map(TokenAmount)
    }

    /// Smaller of two amounts
    pub fn min(self, other: TokenAmount) -> TokenAmount {
        TokenAmount(self.0.min(other.0))
    }

    /// `floor(total * contribution / invested)` — the proportional share of
    /// `total` owed for `contribution` out of `invested`
    ///
    /// `None` when `invested` is zero or the intermediate product overflows.
    pub fn floor_share(
        total: TokenAmount,
        contribution: TokenAmount,
        invested: TokenAmount,
    ) -> Option<TokenAmount> {
        if invested.is_zero() {
            return None;
        }
        total
            .0
            .checked_mul(contribution.0)
            .map(|product| TokenAmount(product / invested.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller/actor identity
///
/// The first byte of an on-chain actor address is its protocol id; host
/// caller identities are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(Vec<u8>);

impl Address {
    /// Create from raw bytes
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Parse from hex, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        hex::decode(s.trim_start_matches("0x"))
            .map(Self)
            .map_err(|e| crate::Error::Config(format!("invalid address hex: {e}")))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Address protocol id (first byte), if any
    pub fn protocol(&self) -> Option<u8> {
        self.0.first().copied()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Deal lifecycle state
///
/// Numeric values are part of the external query surface; 3 is deliberately
/// unassigned to preserve the observed numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum ContractState {
    /// Pooling investor funds toward the target
    Investing = 0,
    /// Fully funded; awaiting proof the deal was published
    Uploading = 1,
    /// Publication verified; dataset access on sale
    Purchasable = 2,
    /// Provider canceled; contributions returned (terminal)
    Canceled = 4,
}

impl ContractState {
    /// Numeric code exposed to external queries
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// True once no further transition is possible
    pub const fn is_terminal(&self) -> bool {
        matches!(self, ContractState::Canceled)
    }
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractState::Investing => "INVESTING",
            ContractState::Uploading => "UPLOADING",
            ContractState::Purchasable => "PURCHASABLE",
            ContractState::Canceled => "CANCELED",
        };
        write!(f, "{name}")
    }
}

/// Immutable deal terms, fixed at creation
#[derive(Debug, Clone, PartialEq)]
pub struct DealTerms {
    /// Human-readable description of the dataset
    pub description: String,

    /// Label the published deal must carry (the deal's "example" field)
    pub example: String,

    /// Funding target; investing closes when reached exactly
    pub initial_investment_target: TokenAmount,

    /// Price of one access purchase
    pub purchase_price: TokenAmount,

    /// Agreed content identifier of the stored piece
    pub piece_cid: PieceCid,

    /// Storage provider actor registered for the deal
    pub provider_actor: Address,
}

/// Result of a successful invest call
#[derive(Debug, Clone, PartialEq)]
pub struct InvestOutcome {
    /// Amount actually escrowed
    pub accepted: TokenAmount,

    /// Excess beyond the funding gap, returned to the caller in the same
    /// call
    pub refunded: TokenAmount,

    /// State after the call
    pub state: ContractState,
}

/// Result of a successful purchase call
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOutcome {
    /// Withdrawable credit added per investor, in first-contribution order
    pub payouts: Vec<(Address, TokenAmount)>,

    /// Rounding remainder retained by the deal
    pub remainder: TokenAmount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_amount_checked_ops() {
        let a = TokenAmount::new(10);
        let b = TokenAmount::new(3);
        assert_eq!(a.checked_add(b), Some(TokenAmount::new(13)));
        assert_eq!(a.checked_sub(b), Some(TokenAmount::new(7)));
        assert_eq!(b.checked_sub(a), None);
        assert_eq!(TokenAmount::new(u128::MAX).checked_add(a), None);
    }

    #[test]
    fn test_floor_share() {
        // 100 * 50 / 100 = 50
        assert_eq!(
            TokenAmount::floor_share(
                TokenAmount::new(100),
                TokenAmount::new(50),
                TokenAmount::new(100)
            ),
            Some(TokenAmount::new(50))
        );
        // 100 * 1 / 3 = 33 (floor)
        assert_eq!(
            TokenAmount::floor_share(
                TokenAmount::new(100),
                TokenAmount::new(1),
                TokenAmount::new(3)
            ),
            Some(TokenAmount::new(33))
        );
        // Division by zero invested
        assert_eq!(
            TokenAmount::floor_share(TokenAmount::new(1), TokenAmount::new(1), TokenAmount::ZERO),
            None
        );
    }

    #[test]
    fn test_address_hex() {
        let addr = Address::from_hex("0x0066").unwrap();
        assert_eq!(addr.as_bytes(), &[0x00, 0x66]);
        assert_eq!(addr.protocol(), Some(0));
        assert_eq!(addr.to_string(), "0x0066");
        assert_eq!(Address::from_hex("0066").unwrap(), addr);
        assert!(Address::from_hex("zz").is_err());
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(ContractState::Investing.code(), 0);
        assert_eq!(ContractState::Uploading.code(), 1);
        assert_eq!(ContractState::Purchasable.code(), 2);
        assert_eq!(ContractState::Canceled.code(), 4);
        assert!(ContractState::Canceled.is_terminal());
        assert!(!ContractState::Purchasable.is_terminal());
    }
}
