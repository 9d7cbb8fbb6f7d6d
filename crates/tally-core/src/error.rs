//! Error types for parsing names and validating operator input.

use thiserror::Error;

/// Errors raised while interpreting names and values supplied by operators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The setting name is not one of the known toggles.
    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    /// The leaderboard metric is not `counts`, `fails` or `cf_ratio`.
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    /// The visibility is not `public` or `unlisted`.
    #[error("unknown visibility: {0}")]
    UnknownVisibility(String),

    /// Counts are never negative.
    #[error("count must not be negative, got {0}")]
    NegativeCount(i64),
}

impl CoreError {
    /// Get a static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSetting(_) => "unknown_setting",
            Self::UnknownMetric(_) => "unknown_metric",
            Self::UnknownVisibility(_) => "unknown_visibility",
            Self::NegativeCount(_) => "negative_count",
        }
    }
}
