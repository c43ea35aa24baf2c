//! # Recommendation Crate
//!
//! Lifecycle management for recommendations surfaced by a matching channel.
//!
//! ## Main Components
//!
//! - **types**: The persisted `Recommendation`, the raw `ChannelRecommendation`
//!   payload and collaborator results
//! - **photos**: `PhotoSet`, the id-keyed photo union
//! - **traits**: Collaborator seams (`Taste`, `Channel`, `MatchingChannel`, `Observer`)
//! - **store**: `RecommendationStore` plus in-memory and JSON file stores
//! - **resolver**: Find-or-create lookup by `(channel, channel_id)`
//! - **manager**: `RecommendationManager` with `check_out` and `like_or_pass`
//! - **error**: Error taxonomy
//!
//! ## Example Usage
//!
//! ```ignore
//! use recommendation::{MemoryStore, RecommendationManager, RecommendationStore};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let manager = RecommendationManager::new(store.clone(), taste);
//!
//! // Evaluate once, then persist
//! let rec = manager.check_out(&channel, incoming).await?;
//! store.save(&rec).await?;
//!
//! // Later: act on the decision, then persist again
//! let rec = manager.like_or_pass(&channel, rec).await?;
//! store.save(&rec).await?;
//! ```

pub mod error;
pub mod manager;
pub mod photos;
pub mod resolver;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RecommendationError, Result};
pub use manager::RecommendationManager;
pub use photos::PhotoSet;
pub use resolver::find_or_create;
pub use store::{JsonFileStore, MemoryStore, RecommendationStore};
pub use traits::{Channel, MatchingChannel, Observer, Taste, TracingObserver};
pub use types::{
    ChannelRecommendation, Evaluation, LikeOutcome, Match, Photo, Recommendation,
    RecommendationKey,
};
