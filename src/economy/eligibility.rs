//! Reward eligibility: at most one payout per reason per sliding window.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use super::clock;
use super::Result;
use crate::interfaces::{LedgerStore, LedgerTx};

/// Decides whether a reason may pay out again.
///
/// A reason is eligible iff the ledger holds no transaction for the same user
/// and reason created strictly after the window start. The window slides:
/// a grant at 09:00 blocks the reason until 09:00 the next day, regardless of
/// the calendar date.
#[derive(Clone)]
pub struct EligibilityChecker {
    store: Arc<dyn LedgerStore>,
    window: Duration,
}

impl EligibilityChecker {
    pub fn new(store: Arc<dyn LedgerStore>, window: Duration) -> Self {
        Self { store, window }
    }

    /// Window start for a request made at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        clock::window_start(now, self.window)
    }

    /// Read-only check against committed ledger state.
    ///
    /// The answer can be stale by the time a grant is attempted; the granter
    /// repeats the check under lock.
    pub async fn is_eligible(
        &self,
        user_id: &str,
        reason: &str,
        window_start: DateTime<Utc>,
    ) -> Result<bool> {
        let granted = self
            .store
            .has_grant_since(user_id, reason, window_start)
            .await?;
        debug!(%user_id, %reason, %window_start, eligible = !granted, "eligibility checked");
        Ok(!granted)
    }

    /// The same check inside a ledger transaction.
    pub async fn is_eligible_in(
        tx: &mut dyn LedgerTx,
        user_id: &str,
        reason: &str,
        window_start: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(!tx.has_grant_since(user_id, reason, window_start).await?)
    }
}
