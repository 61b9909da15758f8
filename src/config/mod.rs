//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod economy;
mod storage;

pub use economy::{
    EconomyConfig, RewardRule, StageTableConfig, DEFAULT_REWARD_AMOUNT,
    DEFAULT_REWARD_WINDOW_HOURS, MAX_REWARD_WINDOW_HOURS,
};
pub use storage::{PostgresConfig, SqliteConfig, StorageConfig, StorageType};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "sprout.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "SPROUT_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "SPROUT";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "SPROUT_LOG";

use serde::Deserialize;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Reward window must be between 1 and {max} hours, got {hours}")]
    InvalidWindow { hours: i64, max: i64 },

    #[error("Invalid reward rule for category '{category}': {reason}")]
    InvalidReward { category: String, reason: String },

    #[error("Duplicate reward category: {0}")]
    DuplicateCategory(String),

    #[error("Invalid stage table '{id}': {source}")]
    InvalidStageTable {
        id: String,
        #[source]
        source: crate::economy::StageTableError,
    },

    #[error("Duplicate stage table: {0}")]
    DuplicateStageTable(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Reward rules, reward window and stage tables.
    pub economy: EconomyConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `sprout.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    ///
    /// The loaded configuration is validated before it is returned.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check every cross-field constraint the loader cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.economy.validate()
    }

    /// Create config for testing: in-memory storage, default economy.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..Default::default()
            },
            economy: EconomyConfig::default(),
        }
    }
}
