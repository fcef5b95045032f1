//! Orchestrator errors

use finvoice_connect::ConnectError;
use finvoice_core::{Classify, ErrorClass};
use finvoice_ledger::LedgerError;
use finvoice_lifecycle::LifecycleError;
use finvoice_payout::PayoutError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Payout(#[from] PayoutError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    External(#[from] ConnectError),
}

impl Classify for AppError {
    fn class(&self) -> ErrorClass {
        match self {
            AppError::Ledger(inner) => inner.class(),
            AppError::Payout(inner) => inner.class(),
            AppError::Lifecycle(inner) => inner.class(),
            AppError::External(inner) => inner.class(),
        }
    }
}
