//! Store that keeps all records in a single JSON file.
//!
//! The file holds a JSON array of `Recommendation`s. A missing file reads as
//! an empty store. Writes go to a sibling temp file which is then renamed over
//! the original.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::RecommendationStore;
use crate::types::Recommendation;

/// JSON file store.
///
/// Every operation holds `lock` for its full read-modify-write, which makes
/// `mark_checked_out` atomic for all users of this instance. Separate
/// processes sharing the file are not coordinated.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records, in file order
    pub async fn list(&self) -> Result<Vec<Recommendation>> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn read_all(&self) -> Result<Vec<Recommendation>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Reading {}", self.path.display()));
            }
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .with_context(|| format!("Parsing {}", self.path.display()))
    }

    async fn write_all(&self, records: &[Recommendation]) -> Result<()> {
        let json = serde_json::to_string_pretty(records).context("Serializing recommendations")?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Replacing {}", self.path.display()))?;

        debug!("Wrote {} recommendations to {}", records.len(), self.path.display());
        Ok(())
    }
}

fn position(records: &[Recommendation], channel: &str, channel_id: &str) -> Option<usize> {
    records
        .iter()
        .position(|r| r.channel == channel && r.channel_id == channel_id)
}

#[async_trait]
impl RecommendationStore for JsonFileStore {
    async fn find_by_channel_and_channel_id(
        &self,
        channel: &str,
        channel_id: &str,
    ) -> Result<Option<Recommendation>> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        Ok(position(&records, channel, channel_id).map(|i| records.swap_remove(i)))
    }

    async fn mark_checked_out(
        &self,
        channel: &str,
        channel_id: &str,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;

        match position(&records, channel, channel_id) {
            Some(i) if records[i].is_checked_out() => return Ok(false),
            Some(i) => records[i].last_checked_out_date = Some(at),
            None => {
                let mut stub = Recommendation::new(channel, channel_id);
                stub.last_checked_out_date = Some(at);
                records.push(stub);
            }
        }

        self.write_all(&records).await?;
        Ok(true)
    }

    async fn save(&self, recommendation: &Recommendation) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;

        match position(&records, &recommendation.channel, &recommendation.channel_id) {
            Some(i) => records[i] = recommendation.clone(),
            None => records.push(recommendation.clone()),
        }

        self.write_all(&records).await
    }
}
