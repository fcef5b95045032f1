//! In-memory collaborators for tests and the demo scenario
//!
//! The settlement mock stores every receipt under its (id, nonce) key,
//! so replays return the original receipt instead of acting twice, and
//! failures can be scripted with `fail_next` to exercise the
//! reconciliation path.

use crate::error::ConnectError;
use crate::traits::{DocumentVault, Notifier, Receipt, SettlementNetwork, TokenRef};
use async_trait::async_trait;
use chrono::Utc;
use finvoice_core::{InvestmentId, InvoiceId};
use finvoice_lifecycle::{Audience, Notice};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Vault that knows which invoices have their documents on file.
#[derive(Debug, Default)]
pub struct MockDocumentVault {
    complete: Mutex<HashSet<InvoiceId>>,
}

impl MockDocumentVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_documents(&self, invoice_id: InvoiceId) {
        self.complete
            .lock()
            .expect("vault lock poisoned")
            .insert(invoice_id);
    }
}

#[async_trait]
impl DocumentVault for MockDocumentVault {
    async fn has_required_documents(&self, invoice_id: InvoiceId) -> Result<bool, ConnectError> {
        Ok(self
            .complete
            .lock()
            .expect("vault lock poisoned")
            .contains(&invoice_id))
    }
}

/// Settlement network backed by in-memory maps.
#[derive(Debug, Default)]
pub struct MockSettlementNetwork {
    receipts: Mutex<HashMap<(&'static str, Uuid, u64), Receipt>>,
    tokens: Mutex<HashMap<(Uuid, u64), TokenRef>>,
    fail_remaining: AtomicU32,
    calls: AtomicU64,
}

impl MockSettlementNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `n` calls to fail with `Unavailable`.
    pub fn fail_next(&self, n: u32) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    /// Total calls observed, including scripted failures and replays.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn gate(&self) -> Result<(), ConnectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ConnectError::Unavailable("scripted outage".into()));
        }
        Ok(())
    }

    fn idempotent_receipt(
        &self,
        op: &'static str,
        id: Uuid,
        nonce: u64,
    ) -> Result<Receipt, ConnectError> {
        self.gate()?;
        let mut receipts = self.receipts.lock().expect("receipts lock poisoned");
        let receipt = receipts.entry((op, id, nonce)).or_insert_with(|| Receipt {
            reference: format!("{op}-{}", Uuid::new_v4()),
            recorded_at: Utc::now(),
        });
        debug!(op, %id, nonce, reference = %receipt.reference, "settlement call");
        Ok(receipt.clone())
    }
}

#[async_trait]
impl SettlementNetwork for MockSettlementNetwork {
    async fn record_investment(
        &self,
        investment_id: InvestmentId,
        nonce: u64,
    ) -> Result<Receipt, ConnectError> {
        self.idempotent_receipt("record-investment", *investment_id.as_uuid(), nonce)
    }

    async fn mint_ownership_token(
        &self,
        invoice_id: InvoiceId,
        nonce: u64,
    ) -> Result<TokenRef, ConnectError> {
        self.gate()?;
        let mut tokens = self.tokens.lock().expect("tokens lock poisoned");
        let token = tokens
            .entry((*invoice_id.as_uuid(), nonce))
            .or_insert_with(|| TokenRef {
                token: format!("tok-{}", Uuid::new_v4()),
                minted_at: Utc::now(),
            });
        Ok(token.clone())
    }

    async fn record_buyer_payment(
        &self,
        invoice_id: InvoiceId,
        _reference: &str,
        nonce: u64,
    ) -> Result<Receipt, ConnectError> {
        self.idempotent_receipt("buyer-payment", *invoice_id.as_uuid(), nonce)
    }

    async fn settle(&self, invoice_id: InvoiceId, nonce: u64) -> Result<Receipt, ConnectError> {
        self.idempotent_receipt("settle", *invoice_id.as_uuid(), nonce)
    }
}

/// Notifier that records every notice for assertions.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<(Audience, Notice, InvoiceId)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(Audience, Notice, InvoiceId)> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, audience: Audience, notice: Notice, invoice_id: InvoiceId) {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push((audience, notice, invoice_id));
    }
}
