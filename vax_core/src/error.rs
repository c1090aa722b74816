//! Error types for the vax_core library.

use crate::PrincipalKind;
use chrono::NaiveDate;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a password fails the strength policy
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters long")]
    TooShort { min: usize },

    #[error("password needs both uppercase and lowercase characters")]
    MissingCase,

    #[error("password needs at least one digit")]
    MissingDigit,

    #[error("password must contain one of {symbols}")]
    MissingSymbol { symbols: &'static str },
}

/// Malformed input, rejected before any storage access
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    BadDate(String),

    #[error("invalid dose count {0:?}, expected a non-negative integer")]
    BadDoseCount(String),

    #[error("{0} must not be empty")]
    EmptyName(&'static str),

    #[error("weak password: {0}")]
    WeakPassword(#[from] PasswordError),
}

/// Core error type for vax_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input failed boundary validation
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username already present in this principal namespace
    #[error("Username {username:?} is already taken for {kind} accounts")]
    DuplicateUsername {
        kind: PrincipalKind,
        username: String,
    },

    /// Username unknown or password mismatch
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A session already has a logged-in principal
    #[error("Already logged in")]
    AlreadyLoggedIn,

    /// Operation needs a logged-in principal
    #[error("Not logged in")]
    NotLoggedIn,

    /// Logged in, but as the wrong kind of principal
    #[error("Please log in as a {required} first")]
    WrongRole { required: PrincipalKind },

    /// Caregiver already has an open slot or an appointment on this date
    #[error("Caregiver {caregiver:?} is already scheduled on {date}")]
    SlotTaken { caregiver: String, date: NaiveDate },

    /// No unconsumed slot exists for the requested date
    #[error("No caregiver is available on {date}")]
    NoAvailability { date: NaiveDate },

    /// Not enough doses to satisfy the decrement
    #[error("Not enough doses of {vaccine:?} in stock")]
    InsufficientStock { vaccine: String },

    /// Vaccine name has no stock record
    #[error("Unknown vaccine {0:?}")]
    UnknownVaccine(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Store lock could not be acquired in time
    #[error("Timed out after {waited_ms}ms waiting for the store lock")]
    LockTimeout { waited_ms: u64 },

    /// Persistence layer failure not covered above
    #[error("Storage error: {0}")]
    Storage(String),

    /// Argon2 rejected its inputs
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error came from the persistence layer.
    ///
    /// Storage errors are fatal for the request but leave the session intact;
    /// the caller may retry.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Json(_)
                | Error::Csv(_)
                | Error::LockTimeout { .. }
                | Error::Storage(_)
        )
    }
}

impl From<PasswordError> for Error {
    fn from(err: PasswordError) -> Self {
        Error::Validation(ValidationError::WeakPassword(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_classification() {
        assert!(Error::LockTimeout { waited_ms: 10 }.is_storage());
        assert!(Error::Storage("disk full".into()).is_storage());
        assert!(!Error::AlreadyLoggedIn.is_storage());
        assert!(!Error::UnknownVaccine("Pfizer".into()).is_storage());
        assert!(!Error::KeyDerivation("salt too short".into()).is_storage());
    }

    #[test]
    fn test_password_error_converts_to_validation() {
        let err: Error = PasswordError::MissingDigit.into();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::WeakPassword(PasswordError::MissingDigit))
        ));
        assert!(err.to_string().contains("digit"));
    }
}
