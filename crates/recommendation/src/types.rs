//! Core domain types for the recommendation lifecycle.
//!
//! `Recommendation` is the persisted record; `ChannelRecommendation` is the raw
//! payload a channel hands us. The remaining types are what the collaborators
//! return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Channel payload
// =============================================================================

/// A photo attached to a channel recommendation.
///
/// Identity is `id`; everything the channel sends beyond `id` and `url` is
/// kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Photo {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            extra: Map::new(),
        }
    }
}

/// Raw recommendation as received from a channel.
///
/// Only `_id` and `photos` are interpreted; channel-specific fields ride
/// along in `metadata` and are written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecommendation {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ChannelRecommendation {
    pub fn new(id: impl Into<String>, photos: Vec<Photo>) -> Self {
        Self {
            id: id.into(),
            photos,
            metadata: Map::new(),
        }
    }

    /// The photo used to prime the evaluation service
    pub fn primary_photo(&self) -> Option<&Photo> {
        self.photos.first()
    }
}

// =============================================================================
// Persisted record
// =============================================================================

/// Natural key of a recommendation: `(channel, channel_id)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecommendationKey {
    pub channel: String,
    pub channel_id: String,
}

impl RecommendationKey {
    pub fn new(channel: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            channel_id: channel_id.into(),
        }
    }
}

/// A recommendation as stored by the caller.
///
/// `last_checked_out_date` is `None` until the one and only evaluation has
/// happened. The like/match fields only carry meaning once it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub channel: String,
    pub channel_id: String,
    #[serde(default)]
    pub data: Option<ChannelRecommendation>,
    #[serde(default)]
    pub last_checked_out_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like: bool,
    #[serde(default)]
    pub photos_similarity_mean: Option<f64>,
    #[serde(default)]
    pub liked_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "match")]
    pub is_match: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
}

impl Recommendation {
    /// A fresh, never evaluated record for the given key
    pub fn new(channel: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            channel_id: channel_id.into(),
            data: None,
            last_checked_out_date: None,
            like: false,
            photos_similarity_mean: None,
            liked_date: None,
            is_match: false,
            match_id: None,
        }
    }

    pub fn key(&self) -> RecommendationKey {
        RecommendationKey::new(self.channel.clone(), self.channel_id.clone())
    }

    pub fn is_checked_out(&self) -> bool {
        self.last_checked_out_date.is_some()
    }

    /// Photos from the last stored payload, empty if there is none
    pub fn stored_photos(&self) -> &[Photo] {
        self.data.as_ref().map(|d| d.photos.as_slice()).unwrap_or(&[])
    }
}

// =============================================================================
// Collaborator results
// =============================================================================

/// Outcome of scoring a photo set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub like: bool,
    pub face_similarity_mean: f64,
}

/// A mutual match reported by a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Result of a like action on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    #[serde(rename = "match", default)]
    pub matched: Option<Match>,
    pub likes_remaining: u32,
}
