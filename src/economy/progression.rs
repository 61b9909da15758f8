//! Progression stages: which growth stage a currency amount has unlocked.
//!
//! A stage table is an ordered list of `(name, required_amount)` with
//! strictly increasing thresholds. Resolution is a pure lookup:
//!
//! ```text
//! amount:      0 ........ 9 | 10 ....... 24 | 25 ........
//! current:     A              B               C
//! next:        B              C               (none)
//! to next:     10 - amount    25 - amount     0
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, StageTableConfig};

/// One unlockable tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub required_amount: i64,
}

impl Stage {
    pub fn new(name: &str, required_amount: i64) -> Self {
        Self {
            name: name.to_string(),
            required_amount,
        }
    }
}

/// Why a stage table was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageTableError {
    #[error("stage table has no stages")]
    Empty,

    #[error("stage at position {index} has an empty name")]
    EmptyName { index: usize },

    #[error("stage '{name}' has negative threshold {required_amount}")]
    NegativeThreshold { name: String, required_amount: i64 },

    #[error("stage '{name}' threshold {required_amount} does not exceed previous {previous}")]
    NotIncreasing {
        name: String,
        required_amount: i64,
        previous: i64,
    },
}

/// A validated, ordered progression track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    /// Validate and wrap an ordered list of stages.
    pub fn new(stages: Vec<Stage>) -> Result<Self, StageTableError> {
        if stages.is_empty() {
            return Err(StageTableError::Empty);
        }

        let mut previous: Option<i64> = None;
        for (index, stage) in stages.iter().enumerate() {
            if stage.name.trim().is_empty() {
                return Err(StageTableError::EmptyName { index });
            }
            if stage.required_amount < 0 {
                return Err(StageTableError::NegativeThreshold {
                    name: stage.name.clone(),
                    required_amount: stage.required_amount,
                });
            }
            if let Some(previous) = previous {
                if stage.required_amount <= previous {
                    return Err(StageTableError::NotIncreasing {
                        name: stage.name.clone(),
                        required_amount: stage.required_amount,
                        previous,
                    });
                }
            }
            previous = Some(stage.required_amount);
        }

        Ok(Self { stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Resolve an accumulated amount against this table.
    pub fn resolve(&self, accumulated: i64) -> StageResolution {
        let amount = accumulated.max(0);
        // Number of stages unlocked at `amount`.
        let unlocked = self
            .stages
            .partition_point(|stage| stage.required_amount <= amount);

        let current_stage = unlocked
            .checked_sub(1)
            .and_then(|index| self.stages.get(index))
            .cloned();
        let next_stage = self.stages.get(unlocked).cloned();
        let amount_to_next = next_stage
            .as_ref()
            .map(|next| next.required_amount - amount)
            .unwrap_or(0);

        StageResolution {
            current_stage,
            next_stage,
            amount_to_next,
        }
    }
}

/// Outcome of a stage lookup.
///
/// `current_stage` is `None` while the amount is below the first threshold;
/// `next_stage` is `None` once the last stage is unlocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResolution {
    pub current_stage: Option<Stage>,
    pub next_stage: Option<Stage>,
    pub amount_to_next: i64,
}

impl StageResolution {
    pub fn is_complete(&self) -> bool {
        self.next_stage.is_none()
    }
}

/// Resolve `accumulated` against `table`.
pub fn resolve_stage(accumulated: i64, table: &StageTable) -> StageResolution {
    table.resolve(accumulated)
}

/// Every configured stage table, keyed by id. Loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct StageCatalog {
    tables: HashMap<String, StageTable>,
}

impl StageCatalog {
    pub fn from_config(configs: &[StageTableConfig]) -> Result<Self, ConfigError> {
        let mut tables = HashMap::with_capacity(configs.len());
        for config in configs {
            let table = StageTable::new(config.stages.clone()).map_err(|source| {
                ConfigError::InvalidStageTable {
                    id: config.id.clone(),
                    source,
                }
            })?;
            if tables.insert(config.id.clone(), table).is_some() {
                return Err(ConfigError::DuplicateStageTable(config.id.clone()));
            }
        }
        Ok(Self { tables })
    }

    pub fn get(&self, id: &str) -> Option<&StageTable> {
        self.tables.get(id)
    }
}
