//! Error types for the recommendation crate.
//!
//! Two kinds of failure come out of the lifecycle manager:
//! - caller errors (`InvalidArgument`, `AlreadyCheckedOutEarlier`), raised
//!   before any state is touched
//! - collaborator errors (store, taste service, channel), passed through
//!   untouched so the caller sees exactly what the collaborator reported

use thiserror::Error;

/// Errors that can occur while checking out or liking a recommendation
#[derive(Error, Debug)]
pub enum RecommendationError {
    /// A required argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The recommendation was already evaluated by an earlier checkout
    #[error("Recommendation {channel_id} on channel {channel} was already checked out")]
    AlreadyCheckedOutEarlier { channel: String, channel_id: String },

    /// The recommendation store failed
    #[error(transparent)]
    Store(anyhow::Error),

    /// The photo evaluation service failed
    #[error(transparent)]
    Taste(anyhow::Error),

    /// The remote channel failed
    #[error(transparent)]
    Channel(anyhow::Error),
}

impl RecommendationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RecommendationError::InvalidArgument(reason.into())
    }

    pub(crate) fn already_checked_out(channel: &str, channel_id: &str) -> Self {
        RecommendationError::AlreadyCheckedOutEarlier {
            channel: channel.to_string(),
            channel_id: channel_id.to_string(),
        }
    }

    /// True for a duplicate or out-of-order checkout.
    ///
    /// Callers should treat this as a no-op conflict rather than a fault.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RecommendationError::AlreadyCheckedOutEarlier { .. })
    }

    /// Whether the same call could succeed if repeated.
    ///
    /// Caller errors never can. Collaborator errors might, but the retry
    /// policy belongs to the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecommendationError::Store(_)
                | RecommendationError::Taste(_)
                | RecommendationError::Channel(_)
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecommendationError>;
