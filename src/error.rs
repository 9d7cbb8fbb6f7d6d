//! Unified error handling for the counting service.
//!
//! Rule violations are never errors; they are verdict data returned by the
//! engine. What remains here are failures an operator or caller must see.

use crate::store::StoreError;
use tally_core::{CoreError, Embed, Outgoing, Tone};
use thiserror::Error;

/// Errors from counting service operations and operator commands.
#[derive(Debug, Error)]
pub enum CountingError {
    #[error("the counting system is not enabled in this guild")]
    NotEnabled,

    #[error("the counting system is already enabled in this guild")]
    AlreadyEnabled,

    #[error("invalid input: {0}")]
    InvalidInput(#[from] CoreError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl CountingError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotEnabled => "not_enabled",
            Self::AlreadyEnabled => "already_enabled",
            Self::InvalidInput(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Render as the danger embed shown to the member who ran the command.
    ///
    /// Store failures get a generic message; details go to the log only.
    pub fn to_reply(&self) -> Outgoing {
        let description = match self {
            Self::NotEnabled => {
                "The counting system is not enabled in this server. Enable it by running `setup`."
                    .to_string()
            }
            Self::AlreadyEnabled => {
                "The counting system is already enabled in this server.".to_string()
            }
            Self::InvalidInput(CoreError::NegativeCount(_)) => {
                "The count must be zero or a positive number.".to_string()
            }
            Self::InvalidInput(e) => format!("Invalid input: {}.", e),
            Self::Store(_) => "Something went wrong while saving. Please try again.".to_string(),
        };
        Embed::new(Tone::Danger, description).into()
    }
}

/// Result type for counting operations.
pub type CountingResult<T> = Result<T, CountingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_enabled_points_to_setup() {
        let reply = CountingError::NotEnabled.to_reply();
        let Outgoing::Embed(embed) = reply else {
            panic!("expected embed");
        };
        assert_eq!(embed.tone, Tone::Danger);
        assert!(embed.description.contains("setup"));
    }

    #[test]
    fn error_codes_delegate_to_inner_errors() {
        let err = CountingError::from(CoreError::UnknownSetting("x".into()));
        assert_eq!(err.error_code(), "unknown_setting");
        assert_eq!(CountingError::NotEnabled.error_code(), "not_enabled");
    }
}
