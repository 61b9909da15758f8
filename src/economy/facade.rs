//! Economy facade: the single entry point for UI collaborators.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::clock::utc_day;
use super::{
    Clock, EconomyError, EligibilityChecker, Result, RewardGranter, StageCatalog,
    StageResolution, StreakSnapshot, StreakTracker, SystemClock, UserId,
};
use crate::config::{ConfigError, EconomyConfig, RewardRule};
use crate::interfaces::LedgerStore;
use crate::model::BalanceTransaction;

/// What a qualifying activity earned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityOutcome {
    /// Amount credited, 0 if the reason already paid out in the window.
    pub reward_granted: i64,
    /// Balance of the rule's currency after this call.
    pub new_balance: i64,
    pub streak: StreakSnapshot,
}

/// Reward & streak economy.
///
/// Category-specific behaviour (journal, mood, task) is entirely data: each
/// category's [`RewardRule`] names its reason, currency and amount.
#[derive(Clone)]
pub struct Economy {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
    rules: Arc<HashMap<String, RewardRule>>,
    stages: Arc<StageCatalog>,
    eligibility: EligibilityChecker,
    granter: RewardGranter,
    streaks: StreakTracker,
}

impl Economy {
    /// Build the economy over `store` using the wall clock.
    pub fn new(
        store: Arc<dyn LedgerStore>,
        config: &EconomyConfig,
    ) -> std::result::Result<Self, ConfigError> {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Build the economy with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn LedgerStore>,
        config: &EconomyConfig,
        clock: Arc<dyn Clock>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let rules = config
            .rewards
            .iter()
            .map(|rule| (rule.category.clone(), rule.clone()))
            .collect();
        let stages = StageCatalog::from_config(&config.stage_tables)?;

        let eligibility =
            EligibilityChecker::new(store.clone(), Duration::hours(config.reward_window_hours));
        let granter = RewardGranter::new(store.clone(), eligibility.clone(), clock.clone());
        let streaks = StreakTracker::new(store.clone());

        Ok(Self {
            store,
            clock,
            rules: Arc::new(rules),
            stages: Arc::new(stages),
            eligibility,
            granter,
            streaks,
        })
    }

    fn rule(&self, category: &str) -> Result<&RewardRule> {
        self.rules
            .get(category)
            .ok_or_else(|| EconomyError::UnknownCategory(category.to_string()))
    }

    /// Record that the user did something qualifying in `category`.
    ///
    /// Pays the category's reward if its reason has not paid out within the
    /// window, and records the streak day regardless. Grant and streak commit
    /// together or not at all.
    #[tracing::instrument(name = "economy.record_activity", skip_all, fields(%user_id, %category))]
    pub async fn record_qualifying_activity(
        &self,
        user_id: &str,
        category: &str,
    ) -> Result<ActivityOutcome> {
        let user = UserId::parse(user_id)?;
        let rule = self.rule(category)?;
        let now = self.clock.now();
        let today = utc_day(now);

        let eligible = self
            .eligibility
            .is_eligible(user.as_str(), &rule.reason, self.eligibility.window_start(now))
            .await?;

        let mut tx = self.store.begin().await?;
        let (reward_granted, new_balance) = if eligible {
            let grant = self
                .granter
                .grant_in(
                    tx.as_mut(),
                    user.as_str(),
                    &rule.currency,
                    rule.amount,
                    &rule.reason,
                    now,
                )
                .await?;
            let granted = if grant.granted { rule.amount } else { 0 };
            (granted, grant.new_balance)
        } else {
            let balance = self
                .granter
                .balance_in(tx.as_mut(), user.as_str(), &rule.currency)
                .await?;
            (0, balance)
        };
        let streak = StreakTracker::record_in(tx.as_mut(), user.as_str(), category, today).await?;
        tx.commit().await?;

        let outcome = ActivityOutcome {
            reward_granted,
            new_balance,
            streak: streak.into(),
        };
        info!(
            reward_granted,
            new_balance,
            current_streak = streak.current_streak,
            "activity recorded"
        );
        Ok(outcome)
    }

    /// Balance of `currency`, 0 if the user never earned any.
    pub async fn get_balance(&self, user_id: &str, currency: &str) -> Result<i64> {
        let user = UserId::parse(user_id)?;
        Ok(self
            .store
            .balance(user.as_str(), currency)
            .await?
            .unwrap_or(0))
    }

    /// Streak for `category` as of today (UTC).
    pub async fn get_streak(&self, user_id: &str, category: &str) -> Result<StreakSnapshot> {
        let user = UserId::parse(user_id)?;
        let today = utc_day(self.clock.now());
        self.streaks.current(user.as_str(), category, today).await
    }

    /// Growth stage reached with the user's `currency` balance.
    pub async fn resolve_stage(
        &self,
        user_id: &str,
        currency: &str,
        stage_table_id: &str,
    ) -> Result<StageResolution> {
        let user = UserId::parse(user_id)?;
        let table = self
            .stages
            .get(stage_table_id)
            .ok_or_else(|| EconomyError::UnknownStageTable(stage_table_id.to_string()))?;
        let balance = self.get_balance(user.as_str(), currency).await?;
        Ok(table.resolve(balance))
    }

    /// Most recent transactions for `currency`, newest first.
    pub async fn transaction_history(
        &self,
        user_id: &str,
        currency: &str,
        limit: u32,
    ) -> Result<Vec<BalanceTransaction>> {
        let user = UserId::parse(user_id)?;
        Ok(self
            .store
            .transactions(user.as_str(), currency, limit)
            .await?)
    }

    /// Check the ledger invariants for one user.
    ///
    /// - the `currency` balance equals the sum of its transactions
    /// - the `category` streak's current count does not exceed its longest
    pub async fn verify_invariants(
        &self,
        user_id: &str,
        currency: &str,
        category: &str,
    ) -> Result<()> {
        let user = UserId::parse(user_id)?;

        let balance = self.store.balance(user.as_str(), currency).await?.unwrap_or(0);
        let sum = self.store.transaction_sum(user.as_str(), currency).await?;
        if balance != sum {
            warn!(%user, %currency, balance, sum, "balance does not match transactions");
            return Err(EconomyError::InvariantViolation(format!(
                "balance {user}/{currency} is {balance} but transactions sum to {sum}"
            )));
        }
        if balance < 0 {
            warn!(%user, %currency, balance, "negative balance");
            return Err(EconomyError::InvariantViolation(format!(
                "balance {user}/{currency} is negative: {balance}"
            )));
        }

        if let Some(streak) = self.store.streak(user.as_str(), category).await? {
            if streak.current_streak > streak.longest_streak {
                warn!(%user, %category, ?streak, "current streak exceeds longest");
                return Err(EconomyError::InvariantViolation(format!(
                    "streak {user}/{category}: current {} exceeds longest {}",
                    streak.current_streak, streak.longest_streak
                )));
            }
        }

        debug!(%user, %currency, %category, balance, "invariants hold");
        Ok(())
    }
}
