//! sprout: command-line access to the reward economy.
//!
//! Every subcommand prints its result as JSON on stdout; logs go to stderr.
//!
//! ## Configuration
//! ```yaml
//! storage:
//!   type: sqlite
//!   sqlite:
//!     path: ./data/sprout.db
//!
//! economy:
//!   reward_window_hours: 24
//!   rewards:
//!     - category: journal
//!       reason: daily_entry
//!       currency: stamps
//!       amount: 5
//! ```
//!
//! ## Usage
//! ```text
//! sprout record  --user alice --category journal
//! sprout balance --user alice --currency stamps
//! sprout stage   --user alice --currency stamps --table tree
//! ```

use std::future::Future;

use backon::Retryable;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use sprout::config::Config;
use sprout::storage::init_storage;
use sprout::utils::bootstrap::init_tracing;
use sprout::utils::retry::{is_retryable, storage_backoff};
use sprout::{Economy, EconomyError};

#[derive(Parser, Debug)]
#[command(name = "sprout")]
#[command(about = "Rewards, streaks and growth stages for journaling habits")]
struct Cli {
    /// YAML configuration file, layered over ./sprout.yaml and under SPROUT_CONFIG
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a qualifying activity, paying the reward if eligible
    Record {
        #[arg(long)]
        user: String,
        #[arg(long)]
        category: String,
    },
    /// Show a currency balance
    Balance {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
    },
    /// Show the current and longest streak for a category
    Streak {
        #[arg(long)]
        user: String,
        #[arg(long)]
        category: String,
    },
    /// Resolve the growth stage a balance has unlocked
    Stage {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        table: String,
    },
    /// List recent transactions, newest first
    History {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// Check that balances match transactions and streaks are consistent
    Verify {
        #[arg(long)]
        user: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        category: String,
    },
}

/// Run an economy call, retrying storage failures with backoff.
async fn with_retry<T, F, Fut>(op: F) -> Result<T, EconomyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EconomyError>>,
{
    op.retry(storage_backoff())
        .when(is_retryable)
        .notify(|err, delay| warn!(error = %err, ?delay, "storage failure, retrying"))
        .await
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = Config::load(cli.config.as_deref())?;
    let store = init_storage(&config.storage).await?;
    let economy = Economy::new(store, &config.economy)?;

    match &cli.command {
        Command::Record { user, category } => {
            let outcome =
                with_retry(|| economy.record_qualifying_activity(user, category)).await?;
            print_json(&outcome)
        }
        Command::Balance { user, currency } => {
            let balance = with_retry(|| economy.get_balance(user, currency)).await?;
            print_json(&serde_json::json!({ "currency": currency, "balance": balance }))
        }
        Command::Streak { user, category } => {
            let streak = with_retry(|| economy.get_streak(user, category)).await?;
            print_json(&streak)
        }
        Command::Stage {
            user,
            currency,
            table,
        } => {
            let resolution = with_retry(|| economy.resolve_stage(user, currency, table)).await?;
            print_json(&resolution)
        }
        Command::History {
            user,
            currency,
            limit,
        } => {
            let history =
                with_retry(|| economy.transaction_history(user, currency, *limit)).await?;
            print_json(&history)
        }
        Command::Verify {
            user,
            currency,
            category,
        } => {
            with_retry(|| economy.verify_invariants(user, currency, category)).await?;
            print_json(&serde_json::json!({ "ok": true }))
        }
    }
}
