//! Ledger records shared by the storage layer and the economy.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Immutable record of a single balance mutation.
///
/// One row is written per granted reward. Rows are never updated or deleted;
/// they are the audit trail the balance projection is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceTransaction {
    pub id: Uuid,
    pub user_id: String,
    pub currency: String,
    pub amount: i64,
    /// Category tag, e.g. `daily_entry`.
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl BalanceTransaction {
    /// Create a new transaction with a fresh id.
    pub fn new(
        user_id: &str,
        currency: &str,
        amount: i64,
        reason: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            currency: currency.to_string(),
            amount,
            reason: reason.to_string(),
            created_at,
        }
    }
}

/// Stored streak state for one `(user, category)` pair.
///
/// `Streak::default()` is the state of a category with no recorded activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}
