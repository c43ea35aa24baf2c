//! Collaborator traits for the lifecycle manager.
//!
//! The manager never reaches for global state: every collaborator is handed
//! to it through one of these traits, so tests can swap in stubs.
//!
//! ## Design Note
//! - `Send + Sync` lets one manager be shared across tasks
//! - Fallible methods return `anyhow::Result`; the manager wraps the error in
//!   the matching `RecommendationError` variant without altering it

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::types::{Evaluation, LikeOutcome, Photo};

/// Photo evaluation service.
#[async_trait]
pub trait Taste: Send + Sync {
    /// Register the primary photo of a recommendation before scoring.
    async fn first_sight(&self, photo: &Photo) -> Result<()>;

    /// Score a photo set and decide like or pass.
    async fn check_photos_out(&self, photos: &[Photo]) -> Result<Evaluation>;
}

/// An external source of recommendations.
pub trait Channel: Send + Sync {
    /// Name used as the first half of a recommendation's key
    fn name(&self) -> &str;
}

/// A channel that also accepts like actions.
#[async_trait]
pub trait MatchingChannel: Channel {
    /// Like the recommendation with the given channel-scoped id.
    async fn like(&self, channel_id: &str) -> Result<LikeOutcome>;
}

/// Sink for informational signals that are not part of any return value.
///
/// Methods are infallible so a broken sink can never abort an operation.
pub trait Observer: Send + Sync {
    fn likes_remaining(&self, channel: &str, remaining: u32);
}

/// Observer that reports through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn likes_remaining(&self, channel: &str, remaining: u32) {
        info!("Likes remaining on {}: {}", channel, remaining);
    }
}
