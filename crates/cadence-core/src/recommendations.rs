//! Cache of the service's current due list.
//!
//! Entries only ever arrive through [`refresh`]; the reconciler may
//! [`remove`](RecommendationCache::remove) them one at a time.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::CadenceResult;
use crate::traits::ScheduleService;
use crate::types::{Recommendation, TopicId};

/// The current due-list projection.
#[derive(Debug, Clone, Default)]
pub struct RecommendationCache {
    entries: Vec<Recommendation>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl RecommendationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn replace(&mut self, entries: Vec<Recommendation>) {
        self.entries = entries;
        self.refreshed_at = Some(Utc::now());
    }

    /// Remove every entry for a topic. Returns how many were removed.
    pub fn remove(&mut self, topic_id: &TopicId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|rec| &rec.topic_id != topic_id);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(%topic_id, remaining = self.entries.len(), "Dropped recommendation");
        }
        removed
    }

    /// True if the topic is currently recommended.
    pub fn contains(&self, topic_id: &TopicId) -> bool {
        self.entries.iter().any(|rec| &rec.topic_id == topic_id)
    }

    /// Entries in server order.
    pub fn entries(&self) -> &[Recommendation] {
        &self.entries
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = &Recommendation> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing is due.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the last full refresh landed.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Replace the whole cache with the service's current due list.
///
/// The lock is only taken once the fetch has completed. On failure the
/// cache keeps its previous contents.
pub async fn refresh(
    cache: &RwLock<RecommendationCache>,
    service: &dyn ScheduleService,
) -> CadenceResult<usize> {
    let entries = service.fetch_recommendations().await?;
    let count = entries.len();
    cache.write().await.replace(entries);
    info!(count, "Recommendations refreshed");
    Ok(count)
}
