//! Economy error taxonomy.

use crate::interfaces::StorageError;

/// Result type for economy operations.
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Errors surfaced by the economy facade.
///
/// A grant that was skipped because the reason already paid out in the
/// current window is not an error; it is reported as `reward_granted: 0`.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error("No authenticated user")]
    NotAuthenticated,

    #[error("Unknown activity category: {0}")]
    UnknownCategory(String),

    #[error("Unknown stage table: {0}")]
    UnknownStageTable(String),

    #[error("Reward amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl EconomyError {
    /// Whether the caller may retry the same call.
    ///
    /// Only storage failures qualify; nothing was committed when they occur.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EconomyError::StorageUnavailable(_))
    }
}

/// A validated user identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Accept any non-blank identifier; blank means nobody is signed in.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EconomyError::NotAuthenticated);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_rejects_blank() {
        assert!(matches!(UserId::parse(""), Err(EconomyError::NotAuthenticated)));
        assert!(matches!(UserId::parse("   "), Err(EconomyError::NotAuthenticated)));
    }

    #[test]
    fn test_user_id_trims() {
        let user = UserId::parse("  user-1 ").unwrap();
        assert_eq!(user.as_str(), "user-1");
        assert_eq!(user.to_string(), "user-1");
    }

    #[test]
    fn test_only_storage_errors_are_retryable() {
        let storage = EconomyError::StorageUnavailable(StorageError::Unavailable("down".into()));
        assert!(storage.is_retryable());
        assert!(!EconomyError::NotAuthenticated.is_retryable());
        assert!(!EconomyError::UnknownCategory("x".into()).is_retryable());
        assert!(!EconomyError::InvariantViolation("x".into()).is_retryable());
    }
}
