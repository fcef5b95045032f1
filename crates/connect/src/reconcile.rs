//! Reconciliation queue
//!
//! When an external call fails after the local commit already happened,
//! the commit stands and the call is queued here with the idempotency
//! key it was first issued under. Replaying with the same key is safe,
//! so retries can run any number of times.

use crate::error::ConnectError;
use crate::traits::SettlementNetwork;
use chrono::{DateTime, Utc};
use finvoice_core::{InvestmentId, InvoiceId};
use std::sync::Mutex;
use tracing::{info, warn};

/// An external call that still needs to reach the settlement network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalCall {
    RecordInvestment { investment_id: InvestmentId },
    RecordBuyerPayment { invoice_id: InvoiceId, reference: String },
    Settle { invoice_id: InvoiceId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCall {
    pub call: ExternalCall,
    /// Idempotency key assigned when the call was first attempted;
    /// reused verbatim on every retry
    pub nonce: u64,
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ReconciliationQueue {
    pending: Mutex<Vec<PendingCall>>,
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: ExternalCall, nonce: u64) {
        warn!(?call, nonce, "external call queued for reconciliation");
        self.pending
            .lock()
            .expect("queue lock poisoned")
            .push(PendingCall {
                call,
                nonce,
                attempts: 0,
                queued_at: Utc::now(),
            });
    }

    pub fn len(&self) -> usize {
        self.pending.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending(&self) -> Vec<PendingCall> {
        self.pending.lock().expect("queue lock poisoned").clone()
    }

    /// Retry every pending call once. Calls that succeed leave the
    /// queue; calls that fail again stay with their attempt count
    /// bumped. Returns how many were resolved.
    pub async fn drain_and_retry(&self, network: &dyn SettlementNetwork) -> usize {
        let batch = {
            let mut pending = self.pending.lock().expect("queue lock poisoned");
            std::mem::take(&mut *pending)
        };

        let mut resolved = 0;
        let mut remaining = Vec::new();
        for mut entry in batch {
            match replay(network, &entry.call, entry.nonce).await {
                Ok(()) => {
                    info!(call = ?entry.call, nonce = entry.nonce, "reconciled");
                    resolved += 1;
                }
                Err(err) => {
                    entry.attempts += 1;
                    warn!(
                        call = ?entry.call,
                        attempts = entry.attempts,
                        %err,
                        "reconciliation retry failed"
                    );
                    remaining.push(entry);
                }
            }
        }

        if !remaining.is_empty() {
            self.pending
                .lock()
                .expect("queue lock poisoned")
                .extend(remaining);
        }
        resolved
    }
}

async fn replay(
    network: &dyn SettlementNetwork,
    call: &ExternalCall,
    nonce: u64,
) -> Result<(), ConnectError> {
    match call {
        ExternalCall::RecordInvestment { investment_id } => {
            network.record_investment(*investment_id, nonce).await?;
        }
        ExternalCall::RecordBuyerPayment {
            invoice_id,
            reference,
        } => {
            network
                .record_buyer_payment(*invoice_id, reference, nonce)
                .await?;
        }
        ExternalCall::Settle { invoice_id } => {
            network.settle(*invoice_id, nonce).await?;
        }
    }
    Ok(())
}
