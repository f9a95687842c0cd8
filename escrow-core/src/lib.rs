//! Dealbridge escrow core
//!
//! Escrow-and-deal-verification engine: pools contributions from investors
//! to fund a data storage deal, authenticates the published deal from an
//! externally delivered, untrusted CBOR notification, then sells dataset
//! access and distributes proceeds back to investors proportionally.
//!
//! # Architecture
//!
//! - **Single Aggregate**: one [`DealEngine`] owns every balance, list, and
//!   the state enum; all mutation routes through its guarded operations
//! - **Single Writer**: a tokio actor serializes calls, mirroring the
//!   host's one-call-at-a-time execution model
//! - **Atomic Operations**: every call validates fully before mutating;
//!   a failure leaves zero observable effect
//! - **Pull Payments**: refunds and sale proceeds become withdrawable
//!   credits, so one uncooperative recipient cannot starve the rest

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod authenticator;
pub mod config;
pub mod deal;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod proposal;
pub mod types;

// Re-exports
pub use actor::{spawn_deal_actor, DealHandle};
pub use authenticator::{MessageAuthenticator, CBOR_CODEC, DEAL_PUBLISHED_METHOD_NUM};
pub use config::Config;
pub use deal::DealEngine;
pub use error::{Error, Result};
pub use ledger::EscrowLedger;
pub use proposal::DealProposal;
pub use types::{
    Address, ChainEpoch, ContractState, DealTerms, InvestOutcome, PurchaseOutcome, TokenAmount,
};

pub use cbor_core::PieceCid;
