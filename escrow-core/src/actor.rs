//! Actor-based concurrency for the deal engine
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`DealEngine`]; callers never share mutable state
//! - Calls are serialized through a bounded mailbox, mirroring the host's
//!   one-call-at-a-time execution model
//! - Async message passing with backpressure
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Callers (investors, bridge, buyers)          │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ method calls
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                DealHandle (Clone)                     │
//! │          Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               DealActor (Single Task)                 │
//! │              owns the DealEngine state                │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::{
    deal::DealEngine,
    proposal::DealProposal,
    types::{Address, ContractState, InvestOutcome, PurchaseOutcome, TokenAmount},
    Error, Result,
};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the deal actor
pub enum DealMessage {
    /// Contribute funds
    Invest {
        /// Calling identity
        caller: Address,
        /// Attached fund amount
        amount: TokenAmount,
        /// Response channel
        response: oneshot::Sender<Result<InvestOutcome>>,
    },

    /// Cancel the deal
    Cancel {
        /// Calling identity
        caller: Address,
        /// Response channel
        response: oneshot::Sender<Result<Vec<(Address, TokenAmount)>>>,
    },

    /// Pay for dataset access
    Purchase {
        /// Calling identity
        caller: Address,
        /// Attached payment
        payment: TokenAmount,
        /// Response channel
        response: oneshot::Sender<Result<PurchaseOutcome>>,
    },

    /// Deliver a deal notification
    HandleFilecoinMethod {
        /// Delivering identity
        caller: Address,
        /// Method selector of the notification
        method_number: u64,
        /// Params codec identifier
        codec: u64,
        /// Raw notification payload
        payload: Vec<u8>,
        /// Response channel
        response: oneshot::Sender<Result<DealProposal>>,
    },

    /// Withdraw outstanding credit
    Withdraw {
        /// Calling identity
        caller: Address,
        /// Response channel
        response: oneshot::Sender<Result<TokenAmount>>,
    },

    /// Get current state
    GetState {
        /// Response channel
        response: oneshot::Sender<ContractState>,
    },

    /// Get escrowed total
    GetInvested {
        /// Response channel
        response: oneshot::Sender<TokenAmount>,
    },

    /// Get an address's withdrawable credit
    GetWithdrawable {
        /// Queried identity
        caller: Address,
        /// Response channel
        response: oneshot::Sender<TokenAmount>,
    },

    /// Shutdown actor
    Shutdown,
}

impl std::fmt::Debug for DealMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DealMessage::Invest { .. } => "Invest",
            DealMessage::Cancel { .. } => "Cancel",
            DealMessage::Purchase { .. } => "Purchase",
            DealMessage::HandleFilecoinMethod { .. } => "HandleFilecoinMethod",
            DealMessage::Withdraw { .. } => "Withdraw",
            DealMessage::GetState { .. } => "GetState",
            DealMessage::GetInvested { .. } => "GetInvested",
            DealMessage::GetWithdrawable { .. } => "GetWithdrawable",
            DealMessage::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// Actor that processes deal messages
#[derive(Debug)]
pub struct DealActor {
    /// The aggregate, owned exclusively by this task
    engine: DealEngine,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<DealMessage>,
}

impl DealActor {
    /// Create new actor
    pub fn new(engine: DealEngine, mailbox: mpsc::Receiver<DealMessage>) -> Self {
        Self { engine, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                DealMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: DealMessage) {
        match msg {
            DealMessage::Invest {
                caller,
                amount,
                response,
            } => {
                let _ = response.send(self.engine.invest(&caller, amount));
            }

            DealMessage::Cancel { caller, response } => {
                let _ = response.send(self.engine.cancel(&caller));
            }

            DealMessage::Purchase {
                caller,
                payment,
                response,
            } => {
                let _ = response.send(self.engine.purchase(&caller, payment));
            }

            DealMessage::HandleFilecoinMethod {
                caller,
                method_number,
                codec,
                payload,
                response,
            } => {
                let result = self
                    .engine
                    .handle_filecoin_method(&caller, method_number, codec, &payload)
                    .map(|proposal| proposal.clone());
                let _ = response.send(result);
            }

            DealMessage::Withdraw { caller, response } => {
                let _ = response.send(self.engine.withdraw(&caller));
            }

            DealMessage::GetState { response } => {
                let _ = response.send(self.engine.state());
            }

            DealMessage::GetInvested { response } => {
                let _ = response.send(self.engine.invested());
            }

            DealMessage::GetWithdrawable { caller, response } => {
                let _ = response.send(self.engine.ledger().withdrawable_of(&caller));
            }

            DealMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct DealHandle {
    sender: mpsc::Sender<DealMessage>,
}

impl DealHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<DealMessage>) -> Self {
        Self { sender }
    }

    /// Contribute funds
    pub async fn invest(&self, caller: Address, amount: TokenAmount) -> Result<InvestOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::Invest {
                caller,
                amount,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Cancel the deal
    pub async fn cancel(&self, caller: Address) -> Result<Vec<(Address, TokenAmount)>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::Cancel {
                caller,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Pay for dataset access
    pub async fn purchase(&self, caller: Address, payment: TokenAmount) -> Result<PurchaseOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::Purchase {
                caller,
                payment,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Deliver a deal notification
    pub async fn handle_filecoin_method(
        &self,
        caller: Address,
        method_number: u64,
        codec: u64,
        payload: Vec<u8>,
    ) -> Result<DealProposal> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::HandleFilecoinMethod {
                caller,
                method_number,
                codec,
                payload,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Withdraw outstanding credit
    pub async fn withdraw(&self, caller: Address) -> Result<TokenAmount> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::Withdraw {
                caller,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Get current state
    pub async fn state(&self) -> Result<ContractState> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::GetState { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Get escrowed total
    pub async fn invested(&self) -> Result<TokenAmount> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::GetInvested { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Get an address's withdrawable credit
    pub async fn withdrawable(&self, caller: Address) -> Result<TokenAmount> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(DealMessage::GetWithdrawable {
                caller,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(DealMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the deal actor
pub fn spawn_deal_actor(engine: DealEngine) -> DealHandle {
    let (tx, rx) = mpsc::channel(64); // Bounded channel for backpressure
    let actor = DealActor::new(engine, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    DealHandle::new(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    fn addr(tag: u8) -> Address {
        Address::new(vec![0x00, tag])
    }

    fn spawn_default() -> DealHandle {
        let engine = DealEngine::from_config(&Config::default()).unwrap();
        spawn_deal_actor(engine)
    }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let handle = spawn_default();
        assert_eq!(handle.state().await.unwrap(), ContractState::Investing);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_serializes_investments() {
        let handle = spawn_default();

        // Two cloned handles racing toward a target of 100: the actor
        // serializes them, so the total never overshoots
        let h1 = handle.clone();
        let h2 = handle.clone();
        let a = tokio::spawn(async move { h1.invest(addr(0xa1), TokenAmount::new(60)).await });
        let b = tokio::spawn(async move { h2.invest(addr(0xa2), TokenAmount::new(60)).await });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        let outcomes: Vec<_> = [a, b].into_iter().flatten().collect();
        let accepted: u128 = outcomes.iter().map(|o| o.accepted.units()).sum();
        let refunded: u128 = outcomes.iter().map(|o| o.refunded.units()).sum();
        // One call may be rejected after the target is hit; whatever landed
        // never exceeds the target
        assert!(accepted <= 100);
        assert_eq!(handle.invested().await.unwrap().units(), accepted);
        if outcomes.len() == 2 {
            assert_eq!(accepted, 100);
            assert_eq!(refunded, 20);
            assert_eq!(handle.state().await.unwrap(), ContractState::Uploading);
        }

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_actor_cancel_and_withdraw() {
        let handle = spawn_default();
        handle.invest(addr(0xa1), TokenAmount::new(40)).await.unwrap();
        handle.cancel(addr(0x66)).await.unwrap();

        assert_eq!(handle.state().await.unwrap(), ContractState::Canceled);
        assert_eq!(
            handle.withdrawable(addr(0xa1)).await.unwrap(),
            TokenAmount::new(40)
        );
        assert_eq!(
            handle.withdraw(addr(0xa1)).await.unwrap(),
            TokenAmount::new(40)
        );
        handle.shutdown().await.unwrap();
    }
}
