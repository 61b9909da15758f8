//! Reward rules, reward window and progression stage tables.
//!
//! Each activity category maps to exactly one reward rule. The rule names the
//! reason tag written to the ledger, the currency credited and the amount.
//!
//! | Category | Reason                  | Currency | Amount |
//! |----------|-------------------------|----------|--------|
//! | journal  | `daily_entry`           | stamps   | 5      |
//! | mood     | `daily_mood_entry`      | droplets | 5      |
//! | task     | `daily_task_completion` | droplets | 5      |

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use super::ConfigError;
use crate::economy::{Stage, StageTable};

/// Default length of the reward eligibility window.
pub const DEFAULT_REWARD_WINDOW_HOURS: i64 = 24;

/// Upper bound for the reward eligibility window (one year).
pub const MAX_REWARD_WINDOW_HOURS: i64 = 24 * 366;

/// Default amount credited per qualifying activity.
pub const DEFAULT_REWARD_AMOUNT: i64 = 5;

/// Economy configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Length of the sliding window in which a reason pays out at most once.
    ///
    /// Default: 24. Independent of the UTC calendar day used for streaks.
    pub reward_window_hours: i64,

    /// One rule per rewardable activity category.
    pub rewards: Vec<RewardRule>,

    /// Progression tracks, looked up by id.
    pub stage_tables: Vec<StageTableConfig>,
}

/// Reward paid for one activity category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RewardRule {
    /// Activity category, also the streak key (e.g. `journal`).
    pub category: String,
    /// Reason tag written to the ledger (e.g. `daily_entry`).
    pub reason: String,
    /// Currency credited (e.g. `stamps`).
    pub currency: String,
    /// Amount credited; must be positive.
    pub amount: i64,
}

impl RewardRule {
    fn new(category: &str, reason: &str, currency: &str, amount: i64) -> Self {
        Self {
            category: category.to_string(),
            reason: reason.to_string(),
            currency: currency.to_string(),
            amount,
        }
    }
}

/// A named, ordered progression track.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StageTableConfig {
    /// Table id used by read-side callers (e.g. `tree`).
    pub id: String,
    /// Stages sorted ascending by `required_amount`.
    pub stages: Vec<Stage>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            reward_window_hours: DEFAULT_REWARD_WINDOW_HOURS,
            rewards: vec![
                RewardRule::new("journal", "daily_entry", "stamps", DEFAULT_REWARD_AMOUNT),
                RewardRule::new("mood", "daily_mood_entry", "droplets", DEFAULT_REWARD_AMOUNT),
                RewardRule::new(
                    "task",
                    "daily_task_completion",
                    "droplets",
                    DEFAULT_REWARD_AMOUNT,
                ),
            ],
            stage_tables: vec![
                StageTableConfig {
                    id: "tree".to_string(),
                    stages: stages(&[
                        ("seed", 0),
                        ("sprout", 10),
                        ("sapling", 25),
                        ("young_tree", 50),
                        ("tree", 100),
                        ("blossoming_tree", 200),
                    ]),
                },
                StageTableConfig {
                    id: "flower".to_string(),
                    stages: stages(&[
                        ("seed", 0),
                        ("bud", 15),
                        ("bloom", 40),
                        ("full_bloom", 80),
                    ]),
                },
            ],
        }
    }
}

fn stages(table: &[(&str, i64)]) -> Vec<Stage> {
    table
        .iter()
        .map(|(name, required_amount)| Stage::new(name, *required_amount))
        .collect()
}

impl EconomyConfig {
    /// Validate the window, reward rules and stage tables.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_REWARD_WINDOW_HOURS).contains(&self.reward_window_hours) {
            return Err(ConfigError::InvalidWindow {
                hours: self.reward_window_hours,
                max: MAX_REWARD_WINDOW_HOURS,
            });
        }

        let mut categories = HashSet::new();
        // Grants are serialized on the balance row, so a reason must stay in one currency.
        let mut reason_currency: HashMap<&str, &str> = HashMap::new();
        for rule in &self.rewards {
            let invalid = |reason: &str| ConfigError::InvalidReward {
                category: rule.category.clone(),
                reason: reason.to_string(),
            };
            if rule.category.trim().is_empty() {
                return Err(invalid("category is empty"));
            }
            if rule.reason.trim().is_empty() {
                return Err(invalid("reason is empty"));
            }
            if rule.currency.trim().is_empty() {
                return Err(invalid("currency is empty"));
            }
            if rule.amount <= 0 {
                return Err(invalid("amount must be positive"));
            }
            if !categories.insert(rule.category.as_str()) {
                return Err(ConfigError::DuplicateCategory(rule.category.clone()));
            }
            let currency = reason_currency
                .entry(rule.reason.as_str())
                .or_insert(rule.currency.as_str());
            if *currency != rule.currency {
                return Err(invalid("reason is already granted in another currency"));
            }
        }

        let mut ids = HashSet::new();
        for table in &self.stage_tables {
            if !ids.insert(table.id.as_str()) {
                return Err(ConfigError::DuplicateStageTable(table.id.clone()));
            }
            StageTable::new(table.stages.clone()).map_err(|source| {
                ConfigError::InvalidStageTable {
                    id: table.id.clone(),
                    source,
                }
            })?;
        }

        Ok(())
    }

    /// Look up the reward rule for a category.
    pub fn rule(&self, category: &str) -> Option<&RewardRule> {
        self.rewards.iter().find(|rule| rule.category == category)
    }
}
