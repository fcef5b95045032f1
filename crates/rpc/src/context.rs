//! Application context
//!
//! Wires the risk engine, investment ledger, payout distributor and
//! external collaborators into the operations the platform exposes.
//!
//! Ordering around external systems:
//! - before-commit effects (token mint) run first and abort the
//!   transition on failure, so the local state never records an approval
//!   whose token does not exist;
//! - after-commit effects (anchoring, investment recording,
//!   notifications) run once the per-invoice lock is released. A failure
//!   there goes to the reconciliation queue with the idempotency key the
//!   call was first issued under; the local commit stands.

use crate::error::AppError;
use finvoice_connect::{
    DocumentVault, ExternalCall, Notifier, ReconciliationQueue, SettlementNetwork,
};
use finvoice_core::{Amount, Clock, InvestmentId, InvestorId, InvoiceId, SystemClock};
use finvoice_ledger::{
    CancelOutcome, InvestmentLedger, Invoice, InvoiceDraft, Reservation,
};
use finvoice_lifecycle::{Command, CommandPhase, InvoiceEvent, LifecycleError};
use finvoice_payout::{PayoutDistributor, PayoutResult, Settlement};
use finvoice_risk::{BuyerHistory, MarketConditions, RiskEngine, RiskInput, SellerHistory};
use std::sync::Arc;
use tracing::info;

/// Pre-fetched aggregates handed to the risk engine at creation time.
#[derive(Debug, Clone, Default)]
pub struct RiskContext {
    pub seller_history: Option<SellerHistory>,
    pub buyer_history: Option<BuyerHistory>,
    pub market: Option<MarketConditions>,
}

pub struct AppContext {
    risk: RiskEngine,
    ledger: Arc<InvestmentLedger>,
    distributor: PayoutDistributor,
    vault: Arc<dyn DocumentVault>,
    network: Arc<dyn SettlementNetwork>,
    notifier: Arc<dyn Notifier>,
    reconciliation: ReconciliationQueue,
    clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(
        vault: Arc<dyn DocumentVault>,
        network: Arc<dyn SettlementNetwork>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let ledger = Arc::new(InvestmentLedger::new());
        let distributor = PayoutDistributor::new(Arc::clone(&ledger));
        Self::with_parts(
            RiskEngine::new(),
            ledger,
            distributor,
            vault,
            network,
            notifier,
            Arc::new(SystemClock),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_parts(
        risk: RiskEngine,
        ledger: Arc<InvestmentLedger>,
        distributor: PayoutDistributor,
        vault: Arc<dyn DocumentVault>,
        network: Arc<dyn SettlementNetwork>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            risk,
            ledger,
            distributor,
            vault,
            network,
            notifier,
            reconciliation: ReconciliationQueue::new(),
            clock,
        }
    }

    pub fn ledger(&self) -> &Arc<InvestmentLedger> {
        &self.ledger
    }

    pub fn reconciliation(&self) -> &ReconciliationQueue {
        &self.reconciliation
    }

    /// Create a draft invoice with its risk assessment attached.
    ///
    /// Assessment is pure and never blocks creation; missing aggregates
    /// in `context` degrade to the engine's conservative defaults.
    pub fn create_invoice(
        &self,
        draft: InvoiceDraft,
        context: RiskContext,
    ) -> Result<Invoice, AppError> {
        let assessment = self.risk.assess(&RiskInput {
            principal: draft.principal,
            currency: draft.currency.clone(),
            tenor_days: draft.tenor_days,
            quoted_yield: draft.quoted_yield,
            industry: draft.industry.clone(),
            seller_history: context.seller_history,
            buyer_history: context.buyer_history,
            market: context.market,
        });
        let invoice = Invoice::create(draft, assessment, self.clock.now());
        let snapshot = invoice.clone();
        self.ledger.open(invoice)?;
        info!(invoice = %snapshot.id, grade = %snapshot.risk.grade, "invoice created");
        Ok(snapshot)
    }

    /// Submit a draft for review. The document check runs first; an
    /// incomplete document set never reaches the state machine.
    pub async fn submit_for_review(&self, invoice_id: InvoiceId) -> Result<Invoice, AppError> {
        if !self.vault.has_required_documents(invoice_id).await? {
            return Err(AppError::Lifecycle(LifecycleError::DocumentsMissing));
        }
        let (invoice, commands) = self
            .ledger
            .apply_event(&invoice_id, InvoiceEvent::SubmitForReview)?;
        self.run_after_commit(invoice_id, invoice.version, &commands)
            .await;
        Ok(invoice)
    }

    /// Approve a reviewed invoice. The ownership token is minted before
    /// the approval is committed; a mint failure leaves the invoice in
    /// review.
    pub async fn approve(&self, invoice_id: InvoiceId) -> Result<Invoice, AppError> {
        let snapshot = self.ledger.snapshot(&invoice_id)?;
        let planned = self
            .ledger
            .peek_transition(&invoice_id, InvoiceEvent::Approve)?;

        for command in &planned.commands {
            if command.phase() == CommandPhase::BeforeCommit {
                if let Command::MintOwnershipToken = command {
                    let token = self
                        .network
                        .mint_ownership_token(invoice_id, snapshot.version)
                        .await?;
                    info!(invoice = %invoice_id, token = %token.token, "ownership token minted");
                }
            }
        }

        let (invoice, commands) = self.ledger.apply_event(&invoice_id, InvoiceEvent::Approve)?;
        self.run_after_commit(invoice_id, invoice.version, &commands)
            .await;
        Ok(invoice)
    }

    /// Reject a reviewed invoice.
    pub async fn reject(&self, invoice_id: InvoiceId) -> Result<Invoice, AppError> {
        let (invoice, commands) = self.ledger.apply_event(&invoice_id, InvoiceEvent::Reject)?;
        self.run_after_commit(invoice_id, invoice.version, &commands)
            .await;
        Ok(invoice)
    }

    /// Open an approved invoice to investors.
    pub async fn list_invoice(&self, invoice_id: InvoiceId) -> Result<Invoice, AppError> {
        let (invoice, commands) = self.ledger.apply_event(&invoice_id, InvoiceEvent::List)?;
        self.run_after_commit(invoice_id, invoice.version, &commands)
            .await;
        Ok(invoice)
    }

    /// Reserve capacity for an investor.
    ///
    /// The external recording runs after the ledger lock is released;
    /// if it fails the reservation stands and the call is queued for
    /// reconciliation under its original idempotency key.
    pub async fn invest(
        &self,
        invoice_id: InvoiceId,
        investor_id: InvestorId,
        amount: Amount,
    ) -> Result<Reservation, AppError> {
        let reservation = self.ledger.reserve(invoice_id, investor_id, amount)?;

        // Key 0: first (and only) issue of this investment's recording.
        let nonce = 0;
        if self
            .network
            .record_investment(reservation.investment.id, nonce)
            .await
            .is_err()
        {
            self.reconciliation.push(
                ExternalCall::RecordInvestment {
                    investment_id: reservation.investment.id,
                },
                nonce,
            );
        }

        self.run_after_commit(invoice_id, reservation.invoice.version, &reservation.commands)
            .await;
        Ok(reservation)
    }

    /// Cancel an active investment within the window.
    pub async fn cancel_investment(
        &self,
        investment_id: InvestmentId,
    ) -> Result<CancelOutcome, AppError> {
        let outcome = self.ledger.cancel(investment_id)?;
        self.run_after_commit(
            outcome.investment.invoice_id,
            outcome.invoice.version,
            &outcome.commands,
        )
        .await;
        Ok(outcome)
    }

    /// Settle a buyer payment and open the payout for claims.
    pub async fn record_payment(
        &self,
        invoice_id: InvoiceId,
        paid_amount: Amount,
        reference: &str,
        fee: Amount,
    ) -> Result<Settlement, AppError> {
        let settlement = self
            .distributor
            .record_payment(invoice_id, paid_amount, reference, fee)?;

        let nonce = settlement.invoice.version;
        if self
            .network
            .record_buyer_payment(invoice_id, reference, nonce)
            .await
            .is_err()
        {
            self.reconciliation.push(
                ExternalCall::RecordBuyerPayment {
                    invoice_id,
                    reference: reference.to_string(),
                },
                nonce,
            );
        }

        self.run_after_commit(invoice_id, nonce, &settlement.commands)
            .await;
        Ok(settlement)
    }

    /// Determine a default and distribute the recovery.
    pub async fn record_default(
        &self,
        invoice_id: InvoiceId,
        recovered_amount: Amount,
    ) -> Result<Settlement, AppError> {
        let settlement = self
            .distributor
            .record_default(invoice_id, recovered_amount)?;
        self.run_after_commit(invoice_id, settlement.invoice.version, &settlement.commands)
            .await;
        Ok(settlement)
    }

    /// Claim an investor's payout.
    pub fn claim(&self, investment_id: InvestmentId) -> Result<PayoutResult, AppError> {
        Ok(self.distributor.claim(investment_id)?)
    }

    /// Retry every queued external call once; returns how many resolved.
    pub async fn reconcile(&self) -> usize {
        self.reconciliation
            .drain_and_retry(self.network.as_ref())
            .await
    }

    async fn run_after_commit(&self, invoice_id: InvoiceId, nonce: u64, commands: &[Command]) {
        for command in commands {
            match command {
                // Before-commit; already executed by the caller
                Command::MintOwnershipToken => {}
                Command::AnchorStatusEvent => {
                    if self.network.settle(invoice_id, nonce).await.is_err() {
                        self.reconciliation
                            .push(ExternalCall::Settle { invoice_id }, nonce);
                    }
                }
                Command::Notify { audience, notice } => {
                    self.notifier.notify(*audience, *notice, invoice_id).await;
                }
            }
        }
    }
}
