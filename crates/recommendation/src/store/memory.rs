//! In-process store backed by a `HashMap`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RecommendationStore;
use crate::types::{Recommendation, RecommendationKey};

/// Keeps every record in memory. The lock is never held across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<RecommendationKey, Recommendation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`
    pub fn with_records(records: impl IntoIterator<Item = Recommendation>) -> Self {
        let records = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            records: Mutex::new(records),
        }
    }

    /// Number of stored records. Fails if the lock was poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<RecommendationKey, Recommendation>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("recommendation store lock poisoned"))
    }
}

#[async_trait]
impl RecommendationStore for MemoryStore {
    async fn find_by_channel_and_channel_id(
        &self,
        channel: &str,
        channel_id: &str,
    ) -> Result<Option<Recommendation>> {
        let key = RecommendationKey::new(channel, channel_id);
        Ok(self.lock()?.get(&key).cloned())
    }

    async fn mark_checked_out(
        &self,
        channel: &str,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut records = self.lock()?;
        let record = records
            .entry(RecommendationKey::new(channel, channel_id))
            .or_insert_with(|| Recommendation::new(channel, channel_id));

        if record.last_checked_out_date.is_some() {
            return Ok(false);
        }
        record.last_checked_out_date = Some(at);
        Ok(true)
    }

    async fn save(&self, recommendation: &Recommendation) -> Result<()> {
        self.lock()?
            .insert(recommendation.key(), recommendation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = MemoryStore::new();
        let found = store.find_by_channel_and_channel_id("foo", "abc").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_save_then_find() {
        let store = MemoryStore::new();
        let mut rec = Recommendation::new("foo", "abc");
        rec.like = true;

        store.save(&rec).await.unwrap();
        store.save(&rec).await.unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let found = store.find_by_channel_and_channel_id("foo", "abc").await.unwrap();
        assert_eq!(found, Some(rec));
    }

    #[tokio::test]
    async fn test_same_id_on_different_channels_are_distinct() {
        let store = MemoryStore::with_records(vec![
            Recommendation::new("foo", "abc"),
            Recommendation::new("bar", "abc"),
        ]);
        assert_eq!(store.len().unwrap(), 2);

        let bar = store.find_by_channel_and_channel_id("bar", "abc").await.unwrap();
        assert_eq!(bar.map(|r| r.channel), Some("bar".to_string()));
    }

    #[tokio::test]
    async fn test_mark_checked_out_only_once() {
        let store = MemoryStore::new();
        let first = Utc::now();
        let second = first + chrono::Duration::seconds(10);

        assert!(store.mark_checked_out("foo", "abc", first).await.unwrap());
        assert!(!store.mark_checked_out("foo", "abc", second).await.unwrap());

        let stored = store
            .find_by_channel_and_channel_id("foo", "abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.last_checked_out_date, Some(first));
    }

    #[tokio::test]
    async fn test_mark_checked_out_keeps_existing_fields() {
        let mut rec = Recommendation::new("foo", "abc");
        rec.photos_similarity_mean = Some(0.4);
        let store = MemoryStore::with_records(vec![rec]);

        assert!(store.mark_checked_out("foo", "abc", Utc::now()).await.unwrap());

        let stored = store
            .find_by_channel_and_channel_id("foo", "abc")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_checked_out());
        assert_eq!(stored.photos_similarity_mean, Some(0.4));
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = MemoryStore::with_records(vec![Recommendation::new("foo", "abc")]);

        let poison = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = store.records.lock().unwrap();
            panic!("poison the store");
        }));
        assert!(poison.is_err());

        assert!(store.len().is_err());
        assert!(store.is_empty().is_err());
    }
}
