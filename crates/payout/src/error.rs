//! Payout errors

use chrono::{DateTime, Utc};
use finvoice_core::{Amount, Classify, ErrorClass, InvestmentId, InvoiceId};
use finvoice_ledger::LedgerError;
use finvoice_lifecycle::InvoiceStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayoutError {
    #[error("No payout record for invoice {0}")]
    RecordNotFound(InvoiceId),

    #[error("Invoice {0} is already settled")]
    AlreadySettled(InvoiceId),

    #[error("Invoice must be fully funded before settlement (status: {status})")]
    InvoiceNotFunded { status: InvoiceStatus },

    #[error("Payment does not cover the invoice principal of {principal}")]
    InsufficientPayment { principal: Amount },

    #[error("Platform fee of {fee} exceeds the payment")]
    FeeExceedsPayment { fee: Amount },

    #[error("Invoice is not overdue until {overdue_at}")]
    NotOverdue { overdue_at: DateTime<Utc> },

    #[error("No claim slot for investment {0}")]
    ClaimNotFound(InvestmentId),

    #[error("Payout for investment {0} was already claimed")]
    AlreadyClaimed(InvestmentId),

    #[error("Amount arithmetic overflow")]
    AmountOverflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl Classify for PayoutError {
    fn class(&self) -> ErrorClass {
        match self {
            PayoutError::InsufficientPayment { .. }
            | PayoutError::FeeExceedsPayment { .. }
            | PayoutError::AmountOverflow => ErrorClass::Validation,

            PayoutError::RecordNotFound(_)
            | PayoutError::AlreadySettled(_)
            | PayoutError::InvoiceNotFunded { .. }
            | PayoutError::NotOverdue { .. }
            | PayoutError::ClaimNotFound(_)
            | PayoutError::AlreadyClaimed(_) => ErrorClass::StateConflict,

            PayoutError::Ledger(inner) => inner.class(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_claim_is_a_state_conflict() {
        let err = PayoutError::AlreadyClaimed(InvestmentId::new());
        assert_eq!(err.class(), ErrorClass::StateConflict);
    }

    #[test]
    fn test_ledger_errors_keep_their_class() {
        let err = PayoutError::Ledger(LedgerError::BelowMinimum {
            minimum: Amount::from_major(100),
        });
        assert_eq!(err.class(), ErrorClass::Validation);
    }
}
