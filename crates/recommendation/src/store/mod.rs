//! Persistence boundary for recommendations.
//!
//! The lifecycle manager only reads from the store and performs one atomic
//! conditional update (`mark_checked_out`). Saving the returned record is the
//! caller's job, through `save`.

pub mod json_file;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::Recommendation;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage for recommendations keyed by `(channel, channel_id)`.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Look up the record for a key, if one exists.
    async fn find_by_channel_and_channel_id(
        &self,
        channel: &str,
        channel_id: &str,
    ) -> Result<Option<Recommendation>>;

    /// Set `last_checked_out_date` to `at` only if it is currently unset.
    ///
    /// Must be atomic against concurrent callers. An unseen key gets a stub
    /// record holding just the key and the date. Returns `false` when the
    /// record was already checked out, leaving it untouched.
    async fn mark_checked_out(
        &self,
        channel: &str,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Insert or replace the record for its key.
    async fn save(&self, recommendation: &Recommendation) -> Result<()>;
}
