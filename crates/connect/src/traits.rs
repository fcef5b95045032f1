//! External collaborator traits
//!
//! Every settlement-network operation is idempotent by (entity id,
//! nonce): replaying a call with the same pair returns the original
//! receipt instead of acting twice. Notifications are fire-and-forget
//! and must never be awaited inside a locked section.

use crate::error::ConnectError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use finvoice_core::{InvestmentId, InvoiceId};
use finvoice_lifecycle::{Audience, Notice};
use serde::{Deserialize, Serialize};

/// Proof that the settlement network processed a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub reference: String,
    pub recorded_at: DateTime<Utc>,
}

/// Handle to a minted ownership token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRef {
    pub token: String,
    pub minted_at: DateTime<Utc>,
}

/// Verifies the invoice's supporting documents are on file.
#[async_trait]
pub trait DocumentVault: Send + Sync {
    async fn has_required_documents(&self, invoice_id: InvoiceId) -> Result<bool, ConnectError>;
}

/// The external settlement rail.
#[async_trait]
pub trait SettlementNetwork: Send + Sync {
    async fn record_investment(
        &self,
        investment_id: InvestmentId,
        nonce: u64,
    ) -> Result<Receipt, ConnectError>;

    async fn mint_ownership_token(
        &self,
        invoice_id: InvoiceId,
        nonce: u64,
    ) -> Result<TokenRef, ConnectError>;

    async fn record_buyer_payment(
        &self,
        invoice_id: InvoiceId,
        reference: &str,
        nonce: u64,
    ) -> Result<Receipt, ConnectError>;

    async fn settle(&self, invoice_id: InvoiceId, nonce: u64) -> Result<Receipt, ConnectError>;
}

/// Outbound notifications. Best effort; failures are logged, not
/// propagated.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, audience: Audience, notice: Notice, invoice_id: InvoiceId);
}
