//! Ledger errors
//!
//! Every rejected precondition has its own variant so callers and tests
//! can distinguish them individually.

use crate::investment::InvestmentStatus;
use chrono::{DateTime, Utc};
use finvoice_core::{Amount, Classify, ErrorClass, InvestmentId, InvestorId, InvoiceId};
use finvoice_lifecycle::{InvoiceStatus, LifecycleError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(InvestmentId),

    #[error("Invoice already registered: {0}")]
    DuplicateInvoice(InvoiceId),

    #[error("Invoice is not open for investment (status: {status})")]
    NotInvestable { status: InvoiceStatus },

    #[error("Invoice matured at {matured_at}; no further investment")]
    PastMaturity { matured_at: DateTime<Utc> },

    #[error("Investment amount below the minimum of {minimum}")]
    BelowMinimum { minimum: Amount },

    #[error("Investor {investor} already holds an investment on this invoice")]
    DuplicateInvestor { investor: InvestorId },

    #[error("Amount exceeds remaining capacity of {remaining}")]
    CapacityExceeded { remaining: Amount },

    #[error("Investment cannot be cancelled in status {status}")]
    NotCancellable { status: InvestmentStatus },

    #[error("Funding already closed (invoice status: {status})")]
    FundingClosed { status: InvoiceStatus },

    #[error("Cancellation window of {window_hours}h has expired")]
    CancellationWindowExpired { window_hours: i64 },

    #[error("Amount arithmetic overflow")]
    AmountOverflow,

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl Classify for LedgerError {
    fn class(&self) -> ErrorClass {
        match self {
            LedgerError::InvoiceNotFound(_)
            | LedgerError::InvestmentNotFound(_)
            | LedgerError::BelowMinimum { .. }
            | LedgerError::AmountOverflow => ErrorClass::Validation,

            LedgerError::DuplicateInvoice(_)
            | LedgerError::NotInvestable { .. }
            | LedgerError::PastMaturity { .. }
            | LedgerError::DuplicateInvestor { .. }
            | LedgerError::CapacityExceeded { .. }
            | LedgerError::NotCancellable { .. }
            | LedgerError::FundingClosed { .. }
            | LedgerError::CancellationWindowExpired { .. }
            | LedgerError::Lifecycle(_) => ErrorClass::StateConflict,
        }
    }
}
