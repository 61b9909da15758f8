//! Abstract interfaces for sprout components.
//!
//! These traits define the contract the economy needs from durable storage:
//! - Ledger reads (balances, transaction history, streaks)
//! - Ledger transactions (atomic grant + balance + streak writes)

pub mod ledger_store;

pub use ledger_store::{LedgerStore, LedgerTx, Result, StorageError};
