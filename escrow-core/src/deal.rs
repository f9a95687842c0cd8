//! Deal state machine
//!
//! This module ties the ledger, authenticator, and metrics together into the
//! single aggregate that owns a deal's full lifecycle. Every operation
//! checks the current state first, validates fully, and only then mutates;
//! a rejected call leaves the aggregate untouched.
//!
//! # Example
//!
//! ```
//! use escrow_core::{Config, DealEngine, Address, TokenAmount};
//!
//! fn main() -> escrow_core::Result<()> {
//!     let config = Config::default();
//!     let mut deal = DealEngine::from_config(&config)?;
//!
//!     let investor = Address::from_hex("0x00aa")?;
//!     let outcome = deal.invest(&investor, TokenAmount::new(50))?;
//!     assert_eq!(outcome.accepted, TokenAmount::new(50));
//!     Ok(())
//! }
//! ```

use crate::{
    authenticator::MessageAuthenticator,
    ledger::EscrowLedger,
    metrics::Metrics,
    proposal::DealProposal,
    types::{Address, ContractState, DealTerms, InvestOutcome, PurchaseOutcome, TokenAmount},
    Config, Error, Result,
};
use tracing::{info, warn};

/// The deal aggregate
///
/// Owns the terms, the provider identity, the escrow ledger, the state enum,
/// and the authenticated proposal once one arrives. All mutation routes
/// through the operations below.
#[derive(Debug)]
pub struct DealEngine {
    /// Immutable deal terms
    terms: DealTerms,

    /// Provider identity, fixed at construction
    provider: Address,

    /// Notification validator
    authenticator: MessageAuthenticator,

    /// Fund bookkeeping
    ledger: EscrowLedger,

    /// Current lifecycle state
    state: ContractState,

    /// The proposal proven by the deal-published notification
    published: Option<DealProposal>,

    /// Metrics collector
    metrics: Metrics,
}

impl DealEngine {
    /// Create a deal; `provider` becomes the only identity allowed to cancel
    pub fn new(terms: DealTerms, provider: Address, notification_source: Address) -> Result<Self> {
        if terms.initial_investment_target.is_zero() {
            return Err(Error::Config(
                "initial investment target must be positive".to_string(),
            ));
        }
        if terms.purchase_price.is_zero() {
            return Err(Error::Config("purchase price must be positive".to_string()));
        }
        let authenticator = MessageAuthenticator::new(
            notification_source,
            terms.piece_cid,
            terms.provider_actor.clone(),
            terms.example.clone(),
        );
        let metrics = Metrics::new().map_err(|e| Error::Config(e.to_string()))?;
        metrics.update_state(ContractState::Investing.code());

        info!(
            description = %terms.description,
            target = %terms.initial_investment_target,
            price = %terms.purchase_price,
            provider = %provider,
            "deal created"
        );
        Ok(Self {
            terms,
            provider,
            authenticator,
            ledger: EscrowLedger::new(),
            state: ContractState::Investing,
            published: None,
            metrics,
        })
    }

    /// Create a deal from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let (terms, provider, source) = config.deal_setup()?;
        Self::new(terms, provider, source)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ContractState {
        self.state
    }

    /// Immutable deal terms
    pub fn terms(&self) -> &DealTerms {
        &self.terms
    }

    /// Provider identity
    pub fn provider(&self) -> &Address {
        &self.provider
    }

    /// Sum of outstanding contributions
    pub fn invested(&self) -> TokenAmount {
        self.ledger.invested()
    }

    /// Remaining gap to the funding target
    pub fn funding_gap(&self) -> TokenAmount {
        self.terms
            .initial_investment_target
            .checked_sub(self.ledger.invested())
            .unwrap_or(TokenAmount::ZERO)
    }

    /// The proposal proven by the deal-published notification, if any
    pub fn published_proposal(&self) -> Option<&DealProposal> {
        self.published.as_ref()
    }

    /// Fund bookkeeping (read-only)
    pub fn ledger(&self) -> &EscrowLedger {
        &self.ledger
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Contribute funds toward the target
    ///
    /// Accepts up to the remaining gap and refunds the excess within the
    /// same call. Reaching the target exactly transitions to UPLOADING.
    pub fn invest(&mut self, caller: &Address, amount: TokenAmount) -> Result<InvestOutcome> {
        let result = (|| {
            if self.state != ContractState::Investing {
                return Err(Error::NotAcceptingFunds(self.state));
            }
            if caller == &self.provider {
                return Err(Error::SelfDealing(caller.clone()));
            }

            let gap = self
                .terms
                .initial_investment_target
                .checked_sub(self.ledger.invested())
                .ok_or(Error::Overflow("funding gap"))?;
            let accepted = amount.min(gap);
            let refunded = amount
                .checked_sub(accepted)
                .ok_or(Error::Overflow("invest refund"))?;

            self.ledger.record_contribution(caller, accepted)?;
            if self.ledger.invested() == self.terms.initial_investment_target {
                self.state = ContractState::Uploading;
            }
            Ok(InvestOutcome {
                accepted,
                refunded,
                state: self.state,
            })
        })();
        self.observe(result).map(|outcome| {
            // Zero-value calls accept nothing and stay out of the counter
            if !outcome.accepted.is_zero() {
                self.metrics.record_invest(outcome.refunded.units());
            }
            info!(
                caller = %caller,
                accepted = %outcome.accepted,
                refunded = %outcome.refunded,
                state = %outcome.state,
                "investment recorded"
            );
            outcome
        })
    }

    /// Cancel the deal, returning every contribution
    ///
    /// Provider only, and only before the deal becomes purchasable. Refunds
    /// land as withdrawable credits.
    pub fn cancel(&mut self, caller: &Address) -> Result<Vec<(Address, TokenAmount)>> {
        let result = (|| {
            if caller != &self.provider {
                return Err(Error::Unauthorized("only the provider may cancel"));
            }
            match self.state {
                ContractState::Investing | ContractState::Uploading => {}
                actual => {
                    return Err(Error::InvalidState {
                        required: "INVESTING or UPLOADING",
                        actual,
                    })
                }
            }
            let refunds = self.ledger.refund_all()?;
            self.state = ContractState::Canceled;
            Ok(refunds)
        })();
        self.observe(result).map(|refunds| {
            warn!(refund_count = refunds.len(), "deal canceled by provider");
            refunds
        })
    }

    /// Pay the purchase price for dataset access
    ///
    /// Any caller except the provider and investors. The full payment is
    /// split across investors proportionally to their contributions; the
    /// rounding remainder stays with the deal.
    pub fn purchase(&mut self, caller: &Address, payment: TokenAmount) -> Result<PurchaseOutcome> {
        let result = (|| {
            if self.state != ContractState::Purchasable {
                return Err(Error::InvalidState {
                    required: "PURCHASABLE",
                    actual: self.state,
                });
            }
            if caller == &self.provider || self.ledger.is_investor(caller) {
                return Err(Error::SelfDealing(caller.clone()));
            }
            if payment != self.terms.purchase_price {
                return Err(Error::IncorrectPayment {
                    expected: self.terms.purchase_price,
                    actual: payment,
                });
            }
            let (payouts, remainder) = self.ledger.distribute(payment)?;
            self.ledger.record_purchaser(caller);
            Ok(PurchaseOutcome { payouts, remainder })
        })();
        self.observe(result).map(|outcome| {
            self.metrics.record_purchase();
            info!(
                caller = %caller,
                payouts = outcome.payouts.len(),
                remainder = %outcome.remainder,
                "purchase completed"
            );
            outcome
        })
    }

    /// Receive an externally delivered deal notification
    ///
    /// Valid only while UPLOADING. An authenticated, matching notification
    /// transitions the deal to PURCHASABLE exactly once.
    pub fn handle_filecoin_method(
        &mut self,
        caller: &Address,
        method_number: u64,
        codec: u64,
        payload: &[u8],
    ) -> Result<&DealProposal> {
        let result = (|| {
            if self.state != ContractState::Uploading {
                return Err(Error::InvalidState {
                    required: "UPLOADING",
                    actual: self.state,
                });
            }
            let proposal = self
                .authenticator
                .authenticate(method_number, codec, payload, caller)?;
            self.published = Some(proposal);
            self.state = ContractState::Purchasable;
            Ok(())
        })();
        self.observe(result)?;
        self.metrics.record_notification();
        let proposal = self.published.as_ref().ok_or(Error::Concurrency(
            "published proposal missing after transition".to_string(),
        ))?;
        info!(
            provider = %proposal.provider,
            piece_size = proposal.piece_size,
            "deal publication verified"
        );
        Ok(proposal)
    }

    /// Withdraw the caller's full outstanding credit
    pub fn withdraw(&mut self, caller: &Address) -> Result<TokenAmount> {
        let result = (|| {
            let amount = self.ledger.take_credit(caller);
            if amount.is_zero() {
                return Err(Error::NothingToWithdraw(caller.clone()));
            }
            Ok(amount)
        })();
        self.observe(result).map(|amount| {
            info!(caller = %caller, amount = %amount, "credit withdrawn");
            amount
        })
    }

    /// Record the outcome in metrics and keep gauges current
    fn observe<T>(&self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => {
                self.metrics.update_invested(self.ledger.invested().units());
                self.metrics.update_state(self.state.code());
            }
            Err(err) => {
                self.metrics.record_rejection();
                warn!(error = %err, state = %self.state, "operation rejected");
            }
        }
        result
    }
}
