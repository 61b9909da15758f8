//! The reward & streak economy.
//!
//! Components, leaf-first:
//! - [`clock`]: the notion of "now", UTC days and reward windows
//! - [`EligibilityChecker`]: has this reason already paid out in the window?
//! - [`RewardGranter`]: atomic re-check + transaction insert + balance update
//! - [`StreakTracker`]: consecutive UTC-day streaks per category
//! - [`progression`]: pure currency → growth stage lookup
//! - [`Economy`]: the facade external callers use
//!
//! Reward eligibility uses a sliding window ("have you been paid today?")
//! while streaks use UTC calendar days ("did you show up today?"). The two
//! are deliberately independent.

pub mod clock;
mod eligibility;
mod error;
mod facade;
mod granter;
pub mod progression;
mod streak;

pub use clock::{Clock, FixedClock, SystemClock};
pub use eligibility::EligibilityChecker;
pub use error::{EconomyError, Result, UserId};
pub use facade::{ActivityOutcome, Economy};
pub use granter::{GrantOutcome, RewardGranter};
pub use progression::{resolve_stage, Stage, StageCatalog, StageResolution, StageTable, StageTableError};
pub use streak::{StreakSnapshot, StreakTracker, StreakTransition, StreakUpdate};
