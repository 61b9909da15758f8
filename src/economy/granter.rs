//! Reward granting: exactly one transaction per reason per window.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::{Clock, EconomyError, EligibilityChecker, Result};
use crate::interfaces::{LedgerStore, LedgerTx};
use crate::model::BalanceTransaction;

/// Result of a grant attempt.
///
/// `granted == false` means the reason already paid out in the window; the
/// balance is returned unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrantOutcome {
    pub granted: bool,
    pub new_balance: i64,
}

/// The only writer of balance rows.
///
/// A grant is one atomic unit: lock the balance row, re-check eligibility,
/// append the transaction, add the amount. Two concurrent grants for the same
/// reason serialize on the balance lock and the second one sees the first
/// one's transaction.
#[derive(Clone)]
pub struct RewardGranter {
    store: Arc<dyn LedgerStore>,
    eligibility: EligibilityChecker,
    clock: Arc<dyn Clock>,
}

impl RewardGranter {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        eligibility: EligibilityChecker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            eligibility,
            clock,
        }
    }

    /// Grant `amount` of `currency` for `reason` in its own transaction.
    pub async fn grant_reward(
        &self,
        user_id: &str,
        currency: &str,
        amount: i64,
        reason: &str,
    ) -> Result<GrantOutcome> {
        let now = self.clock.now();
        let mut tx = self.store.begin().await?;
        let outcome = self
            .grant_in(tx.as_mut(), user_id, currency, amount, reason, now)
            .await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Grant inside a caller-owned transaction. Nothing is visible to other
    /// callers until that transaction commits.
    pub async fn grant_in(
        &self,
        tx: &mut dyn LedgerTx,
        user_id: &str,
        currency: &str,
        amount: i64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<GrantOutcome> {
        if amount <= 0 {
            return Err(EconomyError::InvalidAmount(amount));
        }

        let balance = tx.lock_balance(user_id, currency).await?;
        let window_start = self.eligibility.window_start(now);
        if !EligibilityChecker::is_eligible_in(tx, user_id, reason, window_start).await? {
            debug!(%user_id, %reason, balance, "already granted in window");
            return Ok(GrantOutcome {
                granted: false,
                new_balance: balance,
            });
        }

        let transaction = BalanceTransaction::new(user_id, currency, amount, reason, now);
        tx.insert_transaction(&transaction).await?;
        let new_balance = tx.add_to_balance(user_id, currency, amount).await?;

        info!(
            %user_id,
            %currency,
            %reason,
            amount,
            new_balance,
            transaction_id = %transaction.id,
            "reward granted"
        );

        Ok(GrantOutcome {
            granted: true,
            new_balance,
        })
    }

    /// Current balance read under the balance lock, for callers that skip
    /// the grant but still report a balance from the same transaction.
    pub async fn balance_in(
        &self,
        tx: &mut dyn LedgerTx,
        user_id: &str,
        currency: &str,
    ) -> Result<i64> {
        Ok(tx.lock_balance(user_id, currency).await?)
    }
}
