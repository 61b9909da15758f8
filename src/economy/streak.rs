//! Consecutive-day streaks per activity category.
//!
//! The streak state machine has three transitions and no decrement:
//!
//! ```text
//!   last == today        HOLD    no change
//!   last == today - 1    EXTEND  current + 1
//!   otherwise            RESET   current = 1
//! ```
//!
//! `longest` is raised to `current` after every EXTEND or RESET.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::clock::days_between;
use super::{EconomyError, Result};
use crate::interfaces::{LedgerStore, LedgerTx};
use crate::model::Streak;

/// Which way a recorded activity moved the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Already recorded today, or `today` is before the last activity.
    Hold,
    /// Activity on the day after the last one.
    Extend,
    /// First activity ever, or a gap of two or more days.
    Reset,
}

impl StreakTransition {
    /// Pick the transition for activity on `today` given the stored state.
    pub fn for_activity(previous: &Streak, today: NaiveDate) -> Self {
        match previous.last_activity_date {
            None => StreakTransition::Reset,
            Some(last) => match days_between(last, today) {
                gap if gap <= 0 => StreakTransition::Hold,
                1 => StreakTransition::Extend,
                _ => StreakTransition::Reset,
            },
        }
    }

    /// Apply this transition to `previous`.
    pub fn apply(self, previous: Streak, today: NaiveDate) -> Streak {
        let current_streak = match self {
            StreakTransition::Hold => return previous,
            StreakTransition::Extend => previous.current_streak.saturating_add(1),
            StreakTransition::Reset => 1,
        };
        Streak {
            current_streak,
            longest_streak: previous.longest_streak.max(current_streak),
            last_activity_date: Some(today),
        }
    }
}

/// Result of recording an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub current_streak: u32,
    pub longest_streak: u32,
    /// `false` when the activity was already counted for `today`.
    pub changed: bool,
}

/// Streak counters as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreakSnapshot {
    pub current_streak: u32,
    pub longest_streak: u32,
}

impl StreakSnapshot {
    /// The streak as seen on `today`.
    ///
    /// A stored streak whose last activity is older than yesterday has lapsed
    /// and reads as 0; the row itself is only rewritten by the next activity.
    pub fn as_of(streak: &Streak, today: NaiveDate) -> Self {
        let alive = streak
            .last_activity_date
            .is_some_and(|last| days_between(last, today) <= 1);
        Self {
            current_streak: if alive { streak.current_streak } else { 0 },
            longest_streak: streak.longest_streak,
        }
    }
}

impl From<StreakUpdate> for StreakSnapshot {
    fn from(update: StreakUpdate) -> Self {
        Self {
            current_streak: update.current_streak,
            longest_streak: update.longest_streak,
        }
    }
}

/// The only writer of streak rows.
#[derive(Clone)]
pub struct StreakTracker {
    store: Arc<dyn LedgerStore>,
}

impl StreakTracker {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Record activity for `category` on `today` in its own transaction.
    pub async fn record_activity(
        &self,
        user_id: &str,
        category: &str,
        today: NaiveDate,
    ) -> Result<StreakUpdate> {
        let mut tx = self.store.begin().await?;
        let update = Self::record_in(tx.as_mut(), user_id, category, today).await?;
        tx.commit().await?;
        Ok(update)
    }

    /// Record activity inside a caller-owned transaction.
    ///
    /// The streak row is locked before it is read, so two first-of-the-day
    /// calls cannot both extend from the same stale value.
    pub async fn record_in(
        tx: &mut dyn LedgerTx,
        user_id: &str,
        category: &str,
        today: NaiveDate,
    ) -> Result<StreakUpdate> {
        let previous = tx.lock_streak(user_id, category).await?;
        let transition = StreakTransition::for_activity(&previous, today);

        if transition == StreakTransition::Hold {
            debug!(%user_id, %category, %today, "streak already recorded");
            return Ok(StreakUpdate {
                current_streak: previous.current_streak,
                longest_streak: previous.longest_streak,
                changed: false,
            });
        }

        let next = transition.apply(previous, today);
        if next.current_streak > next.longest_streak {
            return Err(EconomyError::InvariantViolation(format!(
                "streak {user_id}/{category}: current {} exceeds longest {}",
                next.current_streak, next.longest_streak
            )));
        }
        tx.save_streak(user_id, category, &next).await?;

        info!(
            %user_id,
            %category,
            %today,
            ?transition,
            current_streak = next.current_streak,
            longest_streak = next.longest_streak,
            "streak updated"
        );

        Ok(StreakUpdate {
            current_streak: next.current_streak,
            longest_streak: next.longest_streak,
            changed: true,
        })
    }

    /// Streak for display on `today`. Zero for categories never recorded.
    pub async fn current(
        &self,
        user_id: &str,
        category: &str,
        today: NaiveDate,
    ) -> Result<StreakSnapshot> {
        let stored = self.store.streak(user_id, category).await?;
        Ok(stored
            .map(|streak| StreakSnapshot::as_of(&streak, today))
            .unwrap_or_default())
    }
}
