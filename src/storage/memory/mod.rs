//! In-memory LedgerStore implementation.
//!
//! Used by tests and the `memory` storage type. A write transaction holds an
//! exclusive lock on the whole ledger until it commits or is dropped, so
//! writers are serialized exactly like SQLite's `BEGIN IMMEDIATE`. Writes
//! are staged in the transaction and applied only on commit.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::interfaces::{LedgerStore, LedgerTx, Result, StorageError};
use crate::model::{BalanceTransaction, Streak};

/// Key type for balances `(user_id, currency)` and streaks `(user_id, category)`.
type LedgerKey = (String, String);

fn key(user_id: &str, other: &str) -> LedgerKey {
    (user_id.to_string(), other.to_string())
}

#[derive(Debug, Default)]
struct LedgerState {
    transactions: Vec<BalanceTransaction>,
    balances: HashMap<LedgerKey, i64>,
    streaks: HashMap<LedgerKey, Streak>,
}

impl LedgerState {
    fn has_grant_since(&self, user_id: &str, reason: &str, since: DateTime<Utc>) -> bool {
        self.transactions
            .iter()
            .any(|t| t.user_id == user_id && t.reason == reason && t.created_at > since)
    }
}

/// In-memory ledger with failure injection for tests.
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
    fail_on_begin: RwLock<bool>,
    fail_on_commit: RwLock<bool>,
    fail_on_read: RwLock<bool>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_begin(&self, fail: bool) {
        *self.fail_on_begin.write().await = fail;
    }

    pub async fn set_fail_on_commit(&self, fail: bool) {
        *self.fail_on_commit.write().await = fail;
    }

    pub async fn set_fail_on_read(&self, fail: bool) {
        *self.fail_on_read.write().await = fail;
    }

    /// Overwrite a balance row without a matching transaction.
    ///
    /// Only for exercising invariant checks; the economy never does this.
    pub async fn corrupt_balance(&self, user_id: &str, currency: &str, balance: i64) {
        self.state
            .lock()
            .await
            .balances
            .insert(key(user_id, currency), balance);
    }

    /// Overwrite a streak row directly. Same caveat as `corrupt_balance`.
    pub async fn corrupt_streak(&self, user_id: &str, category: &str, streak: Streak) {
        self.state
            .lock()
            .await
            .streaks
            .insert(key(user_id, category), streak);
    }

    async fn check_read(&self) -> Result<()> {
        if *self.fail_on_read.read().await {
            return Err(StorageError::Unavailable("read failed".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTx>> {
        if *self.fail_on_begin.read().await {
            return Err(StorageError::Unavailable("begin failed".into()));
        }
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryLedgerTx {
            guard,
            transactions: Vec::new(),
            balances: HashMap::new(),
            streaks: HashMap::new(),
            fail_on_commit: *self.fail_on_commit.read().await,
        }))
    }

    async fn has_grant_since(
        &self,
        user_id: &str,
        reason: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        self.check_read().await?;
        Ok(self.state.lock().await.has_grant_since(user_id, reason, since))
    }

    async fn balance(&self, user_id: &str, currency: &str) -> Result<Option<i64>> {
        self.check_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .balances
            .get(&key(user_id, currency))
            .copied())
    }

    async fn transaction_sum(&self, user_id: &str, currency: &str) -> Result<i64> {
        self.check_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.currency == currency)
            .map(|t| t.amount)
            .sum())
    }

    async fn transactions(
        &self,
        user_id: &str,
        currency: &str,
        limit: u32,
    ) -> Result<Vec<BalanceTransaction>> {
        self.check_read().await?;
        let state = self.state.lock().await;
        let mut matching: Vec<BalanceTransaction> = state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id && t.currency == currency)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit as usize);
        Ok(matching)
    }

    async fn streak(&self, user_id: &str, category: &str) -> Result<Option<Streak>> {
        self.check_read().await?;
        Ok(self
            .state
            .lock()
            .await
            .streaks
            .get(&key(user_id, category))
            .copied())
    }
}

/// Staged writes over an exclusively locked ledger.
struct MemoryLedgerTx {
    guard: OwnedMutexGuard<LedgerState>,
    transactions: Vec<BalanceTransaction>,
    balances: HashMap<LedgerKey, i64>,
    streaks: HashMap<LedgerKey, Streak>,
    fail_on_commit: bool,
}

#[async_trait]
impl LedgerTx for MemoryLedgerTx {
    async fn lock_balance(&mut self, user_id: &str, currency: &str) -> Result<i64> {
        let k = key(user_id, currency);
        let committed = self.guard.balances.get(&k).copied().unwrap_or(0);
        Ok(*self.balances.entry(k).or_insert(committed))
    }

    async fn has_grant_since(
        &mut self,
        user_id: &str,
        reason: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let staged = self
            .transactions
            .iter()
            .any(|t| t.user_id == user_id && t.reason == reason && t.created_at > since);
        Ok(staged || self.guard.has_grant_since(user_id, reason, since))
    }

    async fn insert_transaction(&mut self, transaction: &BalanceTransaction) -> Result<()> {
        self.transactions.push(transaction.clone());
        Ok(())
    }

    async fn add_to_balance(&mut self, user_id: &str, currency: &str, amount: i64) -> Result<i64> {
        let balance = self
            .balances
            .get_mut(&key(user_id, currency))
            .ok_or_else(|| StorageError::Unavailable("balance row not locked".into()))?;
        *balance += amount;
        Ok(*balance)
    }

    async fn lock_streak(&mut self, user_id: &str, category: &str) -> Result<Streak> {
        let k = key(user_id, category);
        let committed = self.guard.streaks.get(&k).copied().unwrap_or_default();
        Ok(*self.streaks.entry(k).or_insert(committed))
    }

    async fn save_streak(&mut self, user_id: &str, category: &str, streak: &Streak) -> Result<()> {
        self.streaks.insert(key(user_id, category), *streak);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.fail_on_commit {
            return Err(StorageError::Unavailable("commit failed".into()));
        }
        let MemoryLedgerTx {
            mut guard,
            transactions,
            balances,
            streaks,
            ..
        } = *self;
        guard.transactions.extend(transactions);
        guard.balances.extend(balances);
        guard.streaks.extend(streaks);
        Ok(())
    }
}
