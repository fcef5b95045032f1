//! Finvoice investment ledger
//!
//! Owns per-invoice funding capacity. `reserve` and `cancel` run inside
//! a per-invoice critical section so that capacity is read and debited
//! in the same atomic step: no interleaving of concurrent reservations
//! can push `total_invested` past `funding_goal`. Operations on
//! different invoices never block each other.
//!
//! The ledger drives the invoice lifecycle transitions that are not user
//! actions (`listed ⇄ funding`, `→ funded`) and exposes the same atomic
//! section to the payout distributor via [`InvestmentLedger::with_book`].

pub mod book;
pub mod config;
pub mod error;
pub mod invoice;
pub mod investment;
pub mod ledger;

pub use book::InvoiceBook;
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use invoice::{Invoice, InvoiceDraft};
pub use investment::{Investment, InvestmentStatus};
pub use ledger::{CancelOutcome, InvestmentLedger, Reservation};
