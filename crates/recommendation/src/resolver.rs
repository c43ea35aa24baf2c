//! Find-or-create lookup for recommendations.

use tracing::debug;

use crate::error::{RecommendationError, Result};
use crate::store::RecommendationStore;
use crate::traits::Channel;
use crate::types::Recommendation;

/// Return the stored record for `(channel.name(), channel_id)`, or a fresh
/// unpersisted one if the key has never been seen.
///
/// Read-only: nothing is written to the store.
pub async fn find_or_create(
    store: &dyn RecommendationStore,
    channel: &dyn Channel,
    channel_id: &str,
) -> Result<Recommendation> {
    let channel_name = channel.name();
    if channel_name.is_empty() {
        return Err(RecommendationError::invalid("channel name is empty"));
    }
    if channel_id.is_empty() {
        return Err(RecommendationError::invalid("channel recommendation id is empty"));
    }

    let found = store
        .find_by_channel_and_channel_id(channel_name, channel_id)
        .await
        .map_err(RecommendationError::Store)?;

    match found {
        Some(recommendation) => {
            debug!("Found stored recommendation {} on {}", channel_id, channel_name);
            Ok(recommendation)
        }
        None => {
            debug!("New recommendation {} on {}", channel_id, channel_name);
            Ok(Recommendation::new(channel_name, channel_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct Named(&'static str);

    impl Channel for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[tokio::test]
    async fn test_unseen_key_creates_fresh_record() {
        let store = MemoryStore::new();

        let rec = find_or_create(&store, &Named("foo"), "abc").await.unwrap();

        assert_eq!(rec, Recommendation::new("foo", "abc"));
        assert!(store.is_empty().unwrap(), "resolver must not write");
    }

    #[tokio::test]
    async fn test_existing_key_returns_stored_record() {
        let mut stored = Recommendation::new("foo", "abc");
        stored.photos_similarity_mean = Some(0.3);
        let store = MemoryStore::with_records(vec![stored.clone()]);

        let rec = find_or_create(&store, &Named("foo"), "abc").await.unwrap();

        assert_eq!(rec, stored);
    }

    #[tokio::test]
    async fn test_empty_arguments_rejected() {
        let store = MemoryStore::new();

        let err = find_or_create(&store, &Named(""), "abc").await.unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidArgument(_)));

        let err = find_or_create(&store, &Named("foo"), "").await.unwrap_err();
        assert!(matches!(err, RecommendationError::InvalidArgument(_)));
    }
}
