//! Ledger storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::{BalanceTransaction, Streak};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// Every variant means the ledger could not complete a read or an atomic
/// write. Callers treat all of them as retryable infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("Stored value out of range: {column}={value}")]
    OutOfRange { column: &'static str, value: i64 },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Interface for the ledger: balance transactions, balance projections and
/// streaks.
///
/// Read methods run outside any transaction and see committed state only.
/// All writes go through a [`LedgerTx`] obtained from [`LedgerStore::begin`].
///
/// Implementations:
/// - `SqliteLedgerStore`: SQLite storage
/// - `PostgresLedgerStore`: PostgreSQL storage
/// - `MemoryLedgerStore`: In-memory storage for tests and local runs
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Start a write transaction.
    ///
    /// The returned transaction is rolled back if it is dropped without
    /// [`LedgerTx::commit`] being called.
    async fn begin(&self) -> Result<Box<dyn LedgerTx>>;

    /// Whether a transaction exists for `user_id` and `reason` with
    /// `created_at` strictly after `since`.
    async fn has_grant_since(
        &self,
        user_id: &str,
        reason: &str,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    /// Current balance projection, `None` if no grant ever touched it.
    async fn balance(&self, user_id: &str, currency: &str) -> Result<Option<i64>>;

    /// Sum of all transaction amounts for a user and currency.
    async fn transaction_sum(&self, user_id: &str, currency: &str) -> Result<i64>;

    /// Most recent transactions for a user and currency, newest first.
    async fn transactions(
        &self,
        user_id: &str,
        currency: &str,
        limit: u32,
    ) -> Result<Vec<BalanceTransaction>>;

    /// Stored streak for a user and category, `None` if never recorded.
    async fn streak(&self, user_id: &str, category: &str) -> Result<Option<Streak>>;
}

/// A single atomic unit of ledger writes.
///
/// Reads made through the transaction observe its own uncommitted writes.
/// The `lock_*` methods serialize concurrent writers on the same row: once a
/// transaction holds the lock, a competing transaction blocks until the first
/// commits or rolls back.
#[async_trait]
pub trait LedgerTx: Send {
    /// Lock the balance row for `(user_id, currency)`, creating it at 0 if
    /// absent, and return the current balance.
    async fn lock_balance(&mut self, user_id: &str, currency: &str) -> Result<i64>;

    /// Same as [`LedgerStore::has_grant_since`], inside this transaction.
    async fn has_grant_since(
        &mut self,
        user_id: &str,
        reason: &str,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    /// Append a transaction row.
    async fn insert_transaction(&mut self, transaction: &BalanceTransaction) -> Result<()>;

    /// Add `amount` to the balance row and return the new balance.
    ///
    /// The row must have been created by [`LedgerTx::lock_balance`].
    async fn add_to_balance(&mut self, user_id: &str, currency: &str, amount: i64)
        -> Result<i64>;

    /// Lock the streak row for `(user_id, category)` and return it.
    ///
    /// A category with no recorded activity reads as `Streak::default()`.
    async fn lock_streak(&mut self, user_id: &str, category: &str) -> Result<Streak>;

    /// Insert or replace the streak row.
    async fn save_streak(&mut self, user_id: &str, category: &str, streak: &Streak)
        -> Result<()>;

    /// Commit every write made through this transaction.
    async fn commit(self: Box<Self>) -> Result<()>;
}
