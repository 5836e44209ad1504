//! `bims-finance` — barangay treasury transactions.

pub mod transaction;

pub use transaction::{FinanceSummary, NewTransaction, Transaction, TransactionKind, summarize};
