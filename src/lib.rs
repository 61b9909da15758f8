//! Sprout - reward & streak economy
//!
//! The ledger behind a gamified journaling app: daily rewards paid at most
//! once per sliding window, consecutive-day streaks per activity category,
//! and currency thresholds that unlock growth stages.

pub mod config;
pub mod economy;
pub mod interfaces;
pub mod model;
pub mod storage;
pub mod utils;

pub use economy::{ActivityOutcome, Economy, EconomyError};
