//! Payout distribution
//!
//! Settlement runs inside the ledger's per-invoice critical section via
//! `with_book`, so it serialises with reserve/cancel on the same invoice.
//! Claims never take that lock: once the immutable record exists, each
//! claim is a single compare-and-swap on its slot, and only the winner
//! goes back to the ledger to write the realised return.

use crate::allocation::allocate;
use crate::config::PayoutConfig;
use crate::error::PayoutError;
use crate::record::{PayoutRecord, SettlementKind};
use chrono::Duration;
use finvoice_core::{Amount, Clock, InvestmentId, InvoiceId, SystemClock};
use finvoice_ledger::{Investment, InvestmentLedger, InvestmentStatus, Invoice};
use finvoice_lifecycle::{Command, InvoiceEvent, InvoiceStatus, PaymentStatus};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Outcome of a committed settlement.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub record: Arc<PayoutRecord>,
    pub invoice: Invoice,
    pub commands: Vec<Command>,
}

/// Outcome of a winning claim.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutResult {
    pub investment_id: InvestmentId,
    pub amount: Amount,
    pub kind: SettlementKind,
}

pub struct PayoutDistributor {
    ledger: Arc<InvestmentLedger>,
    records: RwLock<HashMap<InvoiceId, Arc<PayoutRecord>>>,
    config: PayoutConfig,
    clock: Arc<dyn Clock>,
}

impl PayoutDistributor {
    pub fn new(ledger: Arc<InvestmentLedger>) -> Self {
        Self::with_clock(ledger, PayoutConfig::default(), Arc::new(SystemClock))
    }

    pub fn with_clock(
        ledger: Arc<InvestmentLedger>,
        config: PayoutConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            records: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    /// Settle a buyer payment on a funded invoice.
    ///
    /// Requires `paid_amount` to cover the principal. Allocates
    /// `paid_amount - fee` pro-rata by each investment's frozen share,
    /// moves the invoice to `paid` and its investments to `completed`.
    /// A second settlement of the same invoice returns `AlreadySettled`.
    pub fn record_payment(
        &self,
        invoice_id: InvoiceId,
        paid_amount: Amount,
        reference: impl Into<String>,
        fee: Amount,
    ) -> Result<Settlement, PayoutError> {
        let now = self.clock.now();
        let reference = reference.into();

        // The settle-once guard is the book's `settled` flag, checked
        // and set under the per-invoice lock; settlements of different
        // invoices never contend.
        let settlement = self.ledger.with_book(&invoice_id, |book| {
            Ok((|| {
                if book.settled {
                    return Err(PayoutError::AlreadySettled(invoice_id));
                }
                if book.invoice.status != InvoiceStatus::Funded {
                    return Err(PayoutError::InvoiceNotFunded {
                        status: book.invoice.status,
                    });
                }
                if paid_amount < book.invoice.principal {
                    return Err(PayoutError::InsufficientPayment {
                        principal: book.invoice.principal,
                    });
                }
                let scale = book.invoice.currency.minor_unit_scale();
                // Rounded down to the currency's minor unit so the
                // record equals the sum of its slots; sub-minor residue
                // stays with the platform fee.
                let total_payout = paid_amount
                    .checked_sub(&fee)
                    .ok_or(PayoutError::FeeExceedsPayment { fee })?
                    .floor_to_scale(scale);

                let weights = share_weights(book.active_investments());
                let claims = allocate(total_payout, &weights, scale)
                    .ok_or(PayoutError::AmountOverflow)?;

                book.invoice.paid_amount = paid_amount;
                book.invoice.payment_status = PaymentStatus::Paid;
                let commands = book
                    .invoice
                    .apply(InvoiceEvent::RecordPaid)
                    .map_err(finvoice_ledger::LedgerError::from)?
                    .commands;

                let slots = close_out(book, &claims, InvestmentStatus::Completed);
                let record = Arc::new(PayoutRecord::new(
                    invoice_id,
                    SettlementKind::BuyerPayment,
                    paid_amount,
                    fee,
                    total_payout,
                    Some(reference.clone()),
                    slots,
                    now,
                ));
                book.settled = true;

                Ok(Settlement {
                    record,
                    invoice: book.invoice.clone(),
                    commands,
                })
            })())
        })??;

        self.records
            .write()
            .expect("records lock poisoned")
            .insert(invoice_id, Arc::clone(&settlement.record));
        info!(
            invoice = %invoice_id,
            gross = %settlement.record.gross,
            payout = %settlement.record.total_payout,
            "buyer payment settled"
        );
        Ok(settlement)
    }

    /// Settle a default recovery.
    ///
    /// Allowed once the invoice is past maturity plus the grace period,
    /// or already flagged as defaulted. The recovered amount is split
    /// over whatever investments are still active, normalised by share.
    pub fn record_default(
        &self,
        invoice_id: InvoiceId,
        recovered_amount: Amount,
    ) -> Result<Settlement, PayoutError> {
        let now = self.clock.now();

        let settlement = self.ledger.with_book(&invoice_id, |book| {
            Ok((|| {
                if book.settled {
                    return Err(PayoutError::AlreadySettled(invoice_id));
                }
                let status = book.invoice.status;
                let already_flagged = status == InvoiceStatus::Defaulted;
                if !already_flagged {
                    if !status.can_default() {
                        return Err(PayoutError::InvoiceNotFunded { status });
                    }
                    let overdue_at =
                        book.invoice.maturity_date + Duration::days(self.config.default_grace_days);
                    if now < overdue_at {
                        return Err(PayoutError::NotOverdue { overdue_at });
                    }
                }

                let scale = book.invoice.currency.minor_unit_scale();
                let total_payout = recovered_amount.floor_to_scale(scale);
                let weights = share_weights(book.active_investments());
                let claims = if weights.is_empty() {
                    Vec::new()
                } else {
                    allocate(total_payout, &weights, scale)
                        .ok_or(PayoutError::AmountOverflow)?
                };

                book.invoice.paid_amount = recovered_amount;
                book.invoice.payment_status = PaymentStatus::Recovered;
                let commands = if already_flagged {
                    Vec::new()
                } else {
                    book.invoice
                        .apply(InvoiceEvent::DetermineDefault)
                        .map_err(finvoice_ledger::LedgerError::from)?
                        .commands
                };

                let slots = close_out(book, &claims, InvestmentStatus::Defaulted);
                let record = Arc::new(PayoutRecord::new(
                    invoice_id,
                    SettlementKind::DefaultRecovery,
                    recovered_amount,
                    Amount::ZERO,
                    total_payout,
                    None,
                    slots,
                    now,
                ));
                book.settled = true;

                Ok(Settlement {
                    record,
                    invoice: book.invoice.clone(),
                    commands,
                })
            })())
        })??;

        self.records
            .write()
            .expect("records lock poisoned")
            .insert(invoice_id, Arc::clone(&settlement.record));
        info!(
            invoice = %invoice_id,
            recovered = %settlement.record.gross,
            "default recovery settled"
        );
        Ok(settlement)
    }

    /// Claim an investor's payout. Exactly one concurrent call per
    /// investment succeeds; all others get `AlreadyClaimed`.
    pub fn claim(&self, investment_id: InvestmentId) -> Result<PayoutResult, PayoutError> {
        let investment = self.ledger.investment(&investment_id)?;
        let record = {
            let records = self.records.read().expect("records lock poisoned");
            records
                .get(&investment.invoice_id)
                .cloned()
                .ok_or(PayoutError::RecordNotFound(investment.invoice_id))?
        };

        let slot = record
            .slot(&investment_id)
            .ok_or(PayoutError::ClaimNotFound(investment_id))?;
        if !slot.try_claim() {
            return Err(PayoutError::AlreadyClaimed(investment_id));
        }

        let amount = slot.amount();
        self.ledger.with_book(&investment.invoice_id, |book| {
            let investment = book
                .investment_mut(&investment_id)
                .ok_or(finvoice_ledger::LedgerError::InvestmentNotFound(investment_id))?;
            investment.actual_return = Some(amount);
            investment.payout_claimed = true;
            Ok(())
        })?;

        info!(investment = %investment_id, amount = %amount, "payout claimed");
        Ok(PayoutResult {
            investment_id,
            amount,
            kind: record.kind,
        })
    }

    /// The settlement record for an invoice, if one exists.
    pub fn record(&self, invoice_id: &InvoiceId) -> Option<Arc<PayoutRecord>> {
        self.records
            .read()
            .expect("records lock poisoned")
            .get(invoice_id)
            .cloned()
    }
}

fn share_weights<'a>(
    investments: impl Iterator<Item = &'a Investment>,
) -> Vec<(InvestmentId, Decimal)> {
    investments
        .map(|inv| (inv.id, inv.share_percentage))
        .collect()
}

/// Mark every active investment settled and pair it with its claim.
fn close_out(
    book: &mut finvoice_ledger::InvoiceBook,
    claims: &[(InvestmentId, Amount)],
    status: InvestmentStatus,
) -> Vec<(InvestmentId, finvoice_core::InvestorId, Amount)> {
    let mut slots = Vec::with_capacity(claims.len());
    for (investment_id, amount) in claims {
        if let Some(investment) = book.investment_mut(investment_id) {
            investment.status = status;
            slots.push((*investment_id, investment.investor_id, *amount));
        }
    }
    slots
}
