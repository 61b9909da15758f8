//! Retry utilities: backoff builders and retryable error classification.
//!
//! The economy never retries on its own. Callers that want to ride out a
//! busy database wrap their calls with `backon`:
//!
//! ```ignore
//! use backon::Retryable;
//!
//! let outcome = (|| economy.record_qualifying_activity(user, "journal"))
//!     .retry(storage_backoff())
//!     .when(is_retryable)
//!     .await?;
//! ```

use std::time::Duration;

use backon::ExponentialBuilder;

use crate::economy::EconomyError;

/// Standard backoff for retrying storage failures.
///
/// - Min delay: 20ms
/// - Max delay: 1s
/// - Max attempts: 5
/// - Jitter enabled
pub fn storage_backoff() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(20))
        .with_max_delay(Duration::from_secs(1))
        .with_max_times(5)
        .with_jitter()
}

/// Determines if an economy error is worth retrying.
///
/// Only storage failures qualify. Every write runs in a single transaction
/// that either commits or leaves nothing behind, so a retry after a failure
/// cannot double-grant: the eligibility re-check sees any earlier commit.
pub fn is_retryable(error: &EconomyError) -> bool {
    error.is_retryable()
}
