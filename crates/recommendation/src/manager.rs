//! # Recommendation Lifecycle Manager
//!
//! Sequences a recommendation through its two decisions:
//! 1. `check_out`: find or create the record, refuse it if it was evaluated
//!    before, prime and run the photo evaluation, claim the checkout stamp
//!    in the store, stamp the record
//! 2. `like_or_pass`: for a liked record, send the like to the channel and
//!    record the match outcome
//!
//! Both return the mutated record without saving it. Nothing on the record
//! changes unless every collaborator call of the operation succeeded.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{RecommendationError, Result};
use crate::photos::PhotoSet;
use crate::resolver::find_or_create;
use crate::store::RecommendationStore;
use crate::traits::{Channel, MatchingChannel, Observer, Taste, TracingObserver};
use crate::types::{ChannelRecommendation, Recommendation};

/// Drives checkout and like/pass for recommendations
#[derive(Clone)]
pub struct RecommendationManager {
    store: Arc<dyn RecommendationStore>,
    taste: Arc<dyn Taste>,
    observer: Arc<dyn Observer>,
}

impl RecommendationManager {
    /// Create a manager that reports through `tracing`
    pub fn new(store: Arc<dyn RecommendationStore>, taste: Arc<dyn Taste>) -> Self {
        Self::with_observer(store, taste, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        store: Arc<dyn RecommendationStore>,
        taste: Arc<dyn Taste>,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            store,
            taste,
            observer,
        }
    }

    /// Evaluate a channel recommendation exactly once.
    ///
    /// # Errors
    /// * `InvalidArgument` - empty channel name, payload id or photo list
    /// * `AlreadyCheckedOutEarlier` - the key was evaluated before, either
    ///   already stored that way or claimed by a concurrent checkout
    /// * `Store` / `Taste` - collaborator failures, passed through
    pub async fn check_out(
        &self,
        channel: &dyn Channel,
        incoming: ChannelRecommendation,
    ) -> Result<Recommendation> {
        let start_time = Instant::now();
        validate_incoming(channel, &incoming)?;

        let mut recommendation = find_or_create(self.store.as_ref(), channel, &incoming.id).await?;
        if recommendation.is_checked_out() {
            info!(
                "Recommendation {} on {} already checked out, skipping",
                recommendation.channel_id, recommendation.channel
            );
            return Err(RecommendationError::already_checked_out(
                &recommendation.channel,
                &recommendation.channel_id,
            ));
        }

        let primary = incoming
            .primary_photo()
            .ok_or_else(|| RecommendationError::invalid("recommendation has no photos"))?;
        self.taste
            .first_sight(primary)
            .await
            .map_err(RecommendationError::Taste)?;
        debug!("Primed taste with photo {}", primary.id);

        let photos = PhotoSet::union(recommendation.stored_photos(), &incoming.photos);
        debug!(
            "Checking out {} photos ({} stored, {} incoming)",
            photos.len(),
            recommendation.stored_photos().len(),
            incoming.photos.len()
        );
        let evaluation = self
            .taste
            .check_photos_out(photos.as_slice())
            .await
            .map_err(RecommendationError::Taste)?;

        let now = Utc::now();
        let claimed = self
            .store
            .mark_checked_out(&recommendation.channel, &recommendation.channel_id, now)
            .await
            .map_err(RecommendationError::Store)?;
        if !claimed {
            warn!(
                "Lost checkout race for {} on {}",
                recommendation.channel_id, recommendation.channel
            );
            return Err(RecommendationError::already_checked_out(
                &recommendation.channel,
                &recommendation.channel_id,
            ));
        }

        recommendation.last_checked_out_date = Some(now);
        recommendation.data = Some(incoming);
        recommendation.like = evaluation.like;
        recommendation.photos_similarity_mean = Some(evaluation.face_similarity_mean);

        info!(
            "Checked out {} on {}: like={}, similarity={:.3} in {:.2?}",
            recommendation.channel_id,
            recommendation.channel,
            recommendation.like,
            evaluation.face_similarity_mean,
            start_time.elapsed()
        );
        Ok(recommendation)
    }

    /// Act on the like/pass decision of a checked out recommendation.
    ///
    /// A pass returns the record untouched without contacting the channel.
    ///
    /// # Errors
    /// * `InvalidArgument` - empty channel name or id, a record from another
    ///   channel, or a liked record that was never checked out
    /// * `Channel` - the like action failed, passed through
    pub async fn like_or_pass(
        &self,
        channel: &dyn MatchingChannel,
        mut recommendation: Recommendation,
    ) -> Result<Recommendation> {
        let channel_name = channel.name();
        if channel_name.is_empty() {
            return Err(RecommendationError::invalid("channel name is empty"));
        }
        if recommendation.channel_id.is_empty() {
            return Err(RecommendationError::invalid("recommendation channel id is empty"));
        }
        if recommendation.channel != channel_name {
            return Err(RecommendationError::invalid(format!(
                "recommendation belongs to channel {}, not {}",
                recommendation.channel, channel_name
            )));
        }

        if !recommendation.like {
            debug!("Passing on {} on {}", recommendation.channel_id, channel_name);
            return Ok(recommendation);
        }
        if !recommendation.is_checked_out() {
            return Err(RecommendationError::invalid(
                "recommendation was liked without being checked out",
            ));
        }

        let outcome = channel
            .like(&recommendation.channel_id)
            .await
            .map_err(RecommendationError::Channel)?;

        recommendation.liked_date = Some(Utc::now());
        recommendation.is_match = outcome.matched.is_some();
        recommendation.match_id = outcome.matched.map(|m| m.id);
        match &recommendation.match_id {
            Some(match_id) => info!(
                "Matched {} on {} (match {})",
                recommendation.channel_id, channel_name, match_id
            ),
            None => info!("Liked {} on {}", recommendation.channel_id, channel_name),
        }

        self.observer
            .likes_remaining(channel_name, outcome.likes_remaining);

        Ok(recommendation)
    }
}

fn validate_incoming(channel: &dyn Channel, incoming: &ChannelRecommendation) -> Result<()> {
    if channel.name().is_empty() {
        return Err(RecommendationError::invalid("channel name is empty"));
    }
    if incoming.id.is_empty() {
        return Err(RecommendationError::invalid("channel recommendation id is empty"));
    }
    if incoming.photos.is_empty() {
        return Err(RecommendationError::invalid("recommendation has no photos"));
    }
    Ok(())
}
