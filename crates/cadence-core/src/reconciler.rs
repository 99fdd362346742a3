//! Performance reconciliation.
//!
//! The only path by which a performance change becomes durable: the score
//! goes to the scheduling service first, and the store is updated with the
//! service's answer. Nothing is written locally before that answer arrives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::{CadenceError, CadenceResult};
use crate::recommendations::{self, RecommendationCache};
use crate::store::{TopicFields, TopicStore};
use crate::tracker::{InFlightTracker, Operation};
use crate::traits::{ScheduleService, ScheduleUpdate};
use crate::types::{Performance, TopicId, TopicRef};

/// Knobs for cache invalidation and response ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcilePolicy {
    /// Scores strictly above this drop the topic from the due list.
    pub mastery_threshold: f64,
    /// A cache this small or smaller is refilled from the service.
    pub refill_low_water: usize,
    /// Ignore a response that is older than one already applied for the topic.
    pub discard_stale_responses: bool,
}

impl Default for ReconcilePolicy {
    fn default() -> Self {
        Self {
            mastery_threshold: 0.7,
            refill_low_water: 2,
            discard_stale_responses: false,
        }
    }
}

impl From<&DashboardConfig> for ReconcilePolicy {
    fn from(config: &DashboardConfig) -> Self {
        Self {
            mastery_threshold: config.mastery_threshold,
            refill_low_water: config.refill_low_water,
            discard_stale_responses: config.discard_stale_responses,
        }
    }
}

/// What a successful update did.
#[derive(Debug)]
pub struct ReconcileOutcome {
    /// Canonical id the update was sent for.
    pub topic_id: TopicId,
    /// The service's authoritative answer.
    pub update: ScheduleUpdate,
    /// Whether the answer was written into the store.
    pub merged: bool,
    /// Whether the answer was ignored because a newer one was already applied.
    pub stale: bool,
    /// Whether the topic was removed from the recommendation cache.
    pub dropped_from_cache: bool,
    /// Background refill of the recommendation cache, if one was started.
    pub refill: Option<JoinHandle<CadenceResult<usize>>>,
}

impl ReconcileOutcome {
    /// True if a cache refill was started.
    pub fn refill_triggered(&self) -> bool {
        self.refill.is_some()
    }

    /// Wait for the background refill, if any.
    pub async fn wait_for_refill(&mut self) -> Option<CadenceResult<usize>> {
        let handle = self.refill.take()?;
        Some(
            handle
                .await
                .unwrap_or_else(|e| Err(CadenceError::Internal(format!("refill task failed: {}", e)))),
        )
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Sequence {
    issued: u64,
    applied: u64,
}

/// Sends performance updates and folds the answers back into local state.
pub struct PerformanceReconciler {
    service: Arc<dyn ScheduleService>,
    store: Arc<RwLock<TopicStore>>,
    cache: Arc<RwLock<RecommendationCache>>,
    tracker: InFlightTracker,
    policy: ReconcilePolicy,
    sequences: Mutex<HashMap<TopicId, Sequence>>,
}

impl PerformanceReconciler {
    /// Create a reconciler over shared state.
    pub fn new(
        service: Arc<dyn ScheduleService>,
        store: Arc<RwLock<TopicStore>>,
        cache: Arc<RwLock<RecommendationCache>>,
        tracker: InFlightTracker,
        policy: ReconcilePolicy,
    ) -> Self {
        Self {
            service,
            store,
            cache,
            tracker,
            policy,
            sequences: Mutex::new(HashMap::new()),
        }
    }

    /// The active policy.
    pub fn policy(&self) -> &ReconcilePolicy {
        &self.policy
    }

    /// Record a new performance score for a topic.
    ///
    /// Fails before any network call if the reference carries no id. On a
    /// service failure neither the store nor the cache is touched. Two
    /// concurrent updates for the same topic merge in arrival order unless
    /// `discard_stale_responses` is set.
    pub async fn update_performance(
        &self,
        topic: &TopicRef,
        performance: Performance,
    ) -> CadenceResult<ReconcileOutcome> {
        let topic_id = topic
            .canonical_id()
            .cloned()
            .ok_or_else(|| CadenceError::precondition("No topic ID available"))?;

        let seq = self.issue(&topic_id);
        debug!(%topic_id, performance = performance.value(), seq, "Sending performance update");

        let result = {
            let _guard = self.tracker.begin(Operation::Schedule(topic_id.clone()));
            self.service.schedule(&topic_id, performance).await
        };

        let update = match result {
            Ok(update) => update,
            Err(e) => {
                warn!(%topic_id, error = %e, "Performance update failed, keeping prior state");
                return Err(e);
            }
        };

        if !self.settle(&topic_id, seq) {
            warn!(%topic_id, seq, "Discarding stale schedule response");
            return Ok(ReconcileOutcome {
                topic_id,
                update,
                merged: false,
                stale: true,
                dropped_from_cache: false,
                refill: None,
            });
        }

        let fields = TopicFields::from_schedule(performance, &update);
        let merged = match self.store.write().await.merge_topic_fields(&topic_id, &fields) {
            Ok(()) => true,
            Err(e) => {
                warn!(%topic_id, error = %e, "Service accepted an update for a topic missing from the store");
                false
            }
        };

        let (dropped_from_cache, remaining) = {
            let mut cache = self.cache.write().await;
            let dropped = performance.value() > self.policy.mastery_threshold
                && cache.remove(&topic_id) > 0;
            (dropped, cache.len())
        };

        let refill = (remaining <= self.policy.refill_low_water).then(|| self.spawn_refill());

        info!(
            %topic_id,
            next_review = %update.next_review,
            halflife = update.halflife,
            dropped_from_cache,
            refill = refill.is_some(),
            "Performance reconciled"
        );

        Ok(ReconcileOutcome {
            topic_id,
            update,
            merged,
            stale: false,
            dropped_from_cache,
            refill,
        })
    }

    fn issue(&self, topic_id: &TopicId) -> u64 {
        let mut sequences = self.sequences.lock().unwrap_or_else(|p| p.into_inner());
        let entry = sequences.entry(topic_id.clone()).or_default();
        entry.issued += 1;
        entry.issued
    }

    /// Record that the response for `seq` arrived. Returns false if it must be discarded.
    fn settle(&self, topic_id: &TopicId, seq: u64) -> bool {
        let mut sequences = self.sequences.lock().unwrap_or_else(|p| p.into_inner());
        let entry = sequences.entry(topic_id.clone()).or_default();
        if self.policy.discard_stale_responses && seq < entry.applied {
            return false;
        }
        entry.applied = entry.applied.max(seq);
        true
    }

    fn spawn_refill(&self) -> JoinHandle<CadenceResult<usize>> {
        let service = Arc::clone(&self.service);
        let cache = Arc::clone(&self.cache);
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            let _guard = tracker.begin(Operation::LoadRecommendations);
            let result = recommendations::refresh(&cache, service.as_ref()).await;
            if let Err(e) = &result {
                warn!(error = %e, "Recommendation refill failed");
            }
            result
        })
    }
}
