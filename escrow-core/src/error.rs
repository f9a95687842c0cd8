//! Error types for the escrow engine

use crate::types::{Address, ContractState, TokenAmount};
use thiserror::Error;

/// Result type for escrow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Escrow errors
///
/// Every error aborts the triggering call in full; the aggregate performs no
/// internal retries and no partial mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Caller lacks the role the operation requires
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// Operation not valid in the current state
    #[error("invalid state: operation requires {required}, deal is {actual}")]
    InvalidState {
        /// States in which the operation is legal
        required: &'static str,
        /// Current state of the deal
        actual: ContractState,
    },

    /// Invest called outside the funding phase
    #[error("deal is not accepting funds (state {0})")]
    NotAcceptingFunds(ContractState),

    /// Purchase amount differs from the purchase price
    #[error("incorrect payment: expected {expected}, got {actual}")]
    IncorrectPayment {
        /// The fixed purchase price
        expected: TokenAmount,
        /// What the caller attached
        actual: TokenAmount,
    },

    /// Provider or investor attempted to act as a counterparty
    #[error("self dealing by {0}")]
    SelfDealing(Address),

    /// Authenticated proposal does not match the agreed deal terms
    #[error("deal terms mismatch on {field}")]
    DealMismatch {
        /// Which field disagreed
        field: &'static str,
    },

    /// Notification carries an unknown method selector
    #[error("unsupported method number {0}")]
    UnsupportedMethod(u64),

    /// Notification params are not CBOR encoded
    #[error("unsupported params codec {0}")]
    UnsupportedCodec(u64),

    /// Notification payload failed to decode
    #[error("notification payload: {0}")]
    Decode(#[from] cbor_core::DecodeError),

    /// Checked arithmetic overflowed
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Withdraw called with no credit outstanding
    #[error("nothing to withdraw for {0}")]
    NothingToWithdraw(Address),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),
}
