//! The dashboard facade.
//!
//! Owns the topic store, the recommendation cache, the reconciler, the
//! in-flight tracker and a single dismissable error banner. Every failure
//! that reaches the user goes through [`Dashboard::error`].

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::error::CadenceResult;
use crate::recommendations::{self, RecommendationCache};
use crate::reconciler::{PerformanceReconciler, ReconcileOutcome, ReconcilePolicy};
use crate::schedule::{categorize, DueBuckets};
use crate::store::{ScheduledTopic, TopicStore};
use crate::tracker::{InFlightTracker, Operation};
use crate::traits::{RetrainStatus, ScheduleService};
use crate::types::{Performance, Recommendation, Topic, TopicRef};

/// Quick review verdicts, one step of [`Performance::STEP`] each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Good,
    NeedsImprovement,
}

impl ReviewAction {
    /// The score this verdict produces from the current one.
    pub fn apply(self, current: Performance) -> Performance {
        match self {
            ReviewAction::Good => current.step_up(),
            ReviewAction::NeedsImprovement => current.step_down(),
        }
    }
}

/// Summary numbers for the statistics panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// Topics in the store.
    pub total_topics: usize,
    /// Mean performance as a rounded percentage, 0 with no topics.
    pub average_performance: u8,
    /// Entries in the current due list.
    pub due_count: usize,
}

impl DashboardStats {
    /// Compute from the stored scores and the due-list length.
    pub fn compute(scores: impl IntoIterator<Item = Performance>, due_count: usize) -> Self {
        let (total_topics, sum) = scores
            .into_iter()
            .fold((0usize, 0.0), |(n, sum), p| (n + 1, sum + p.value()));
        let average_performance = if total_topics == 0 {
            0
        } else {
            Performance::clamped(sum / total_topics as f64).as_percent()
        };
        Self {
            total_topics,
            average_performance,
            due_count,
        }
    }
}

/// Client-side state of the spaced-repetition tracker.
pub struct Dashboard {
    service: Arc<dyn ScheduleService>,
    store: Arc<RwLock<TopicStore>>,
    cache: Arc<RwLock<RecommendationCache>>,
    reconciler: PerformanceReconciler,
    tracker: InFlightTracker,
    banner: Mutex<Option<String>>,
}

impl Dashboard {
    /// Create a dashboard with default policy.
    pub fn new(service: Arc<dyn ScheduleService>) -> Self {
        Self::with_policy(service, ReconcilePolicy::default())
    }

    /// Create a dashboard using the policy knobs from a config.
    pub fn from_config(service: Arc<dyn ScheduleService>, config: &DashboardConfig) -> Self {
        Self::with_policy(service, ReconcilePolicy::from(config))
    }

    /// Create a dashboard with an explicit policy.
    pub fn with_policy(service: Arc<dyn ScheduleService>, policy: ReconcilePolicy) -> Self {
        let store = Arc::new(RwLock::new(TopicStore::new()));
        let cache = Arc::new(RwLock::new(RecommendationCache::new()));
        let tracker = InFlightTracker::new();
        let reconciler = PerformanceReconciler::new(
            Arc::clone(&service),
            Arc::clone(&store),
            Arc::clone(&cache),
            tracker.clone(),
            policy,
        );
        Self {
            service,
            store,
            cache,
            reconciler,
            tracker,
            banner: Mutex::new(None),
        }
    }

    /// Fetch the full hierarchy and the due list.
    ///
    /// A hierarchy failure is shown to the user; a due-list failure is only
    /// logged and leaves the previous recommendations in place.
    pub async fn load(&self) -> CadenceResult<()> {
        let tree = {
            let _guard = self.tracker.begin(Operation::LoadSubjects);
            self.service.fetch_subjects().await
        };
        match tree {
            Ok(tree) => self.store.write().await.replace_all(tree),
            Err(e) => {
                warn!(error = %e, "Failed to load subjects");
                self.set_error("Failed to load subjects");
                return Err(e);
            }
        }

        if let Err(e) = self.refresh_recommendations().await {
            warn!(error = %e, "Failed to load recommendations");
        }
        Ok(())
    }

    /// Replace the recommendation cache with the service's due list.
    pub async fn refresh_recommendations(&self) -> CadenceResult<usize> {
        let _guard = self.tracker.begin(Operation::LoadRecommendations);
        recommendations::refresh(&self.cache, self.service.as_ref()).await
    }

    /// Record a new score for a topic. Failures go to the banner.
    pub async fn update_performance(
        &self,
        topic: &TopicRef,
        performance: Performance,
    ) -> CadenceResult<ReconcileOutcome> {
        self.reconciler
            .update_performance(topic, performance)
            .await
            .map_err(|e| {
                self.set_error(e.user_message());
                e
            })
    }

    /// Step a topic's current score up or down and record it.
    ///
    /// A topic missing from the store steps from zero.
    pub async fn record_review(
        &self,
        topic: &TopicRef,
        action: ReviewAction,
    ) -> CadenceResult<ReconcileOutcome> {
        let current = self
            .store
            .read()
            .await
            .find_by_ref(topic)
            .map(|view| view.topic.performance)
            .unwrap_or_default();
        self.update_performance(topic, action.apply(current)).await
    }

    /// Create a subject. Blank names are ignored.
    pub async fn add_subject(&self, name: &str) -> CadenceResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }
        let result = {
            let _guard = self.tracker.begin(Operation::Create);
            self.service.create_subject(name).await
        };
        match result {
            Ok(()) => {
                self.store.write().await.upsert_subject(name);
                info!(subject = name, "Subject added");
                Ok(())
            }
            Err(e) => {
                warn!(subject = name, error = %e, "Failed to add subject");
                self.set_error("Failed to add subject");
                Err(e)
            }
        }
    }

    /// Create a subskill under a subject. Blank inputs are ignored.
    pub async fn add_subskill(&self, subject: &str, name: &str) -> CadenceResult<()> {
        let (subject, name) = (subject.trim(), name.trim());
        if subject.is_empty() || name.is_empty() {
            return Ok(());
        }
        let result = {
            let _guard = self.tracker.begin(Operation::Create);
            self.service.create_subskill(subject, name).await
        };
        match result {
            Ok(()) => {
                self.store.write().await.upsert_subskill(subject, name);
                info!(subject, subskill = name, "Subskill added");
                Ok(())
            }
            Err(e) => {
                warn!(subject, subskill = name, error = %e, "Failed to add subskill");
                self.set_error("Failed to add subskill");
                Err(e)
            }
        }
    }

    /// Create a topic. Returns None when an input is blank.
    pub async fn add_topic(
        &self,
        subject: &str,
        subskill: &str,
        name: &str,
    ) -> CadenceResult<Option<Topic>> {
        let (subject, subskill, name) = (subject.trim(), subskill.trim(), name.trim());
        if subject.is_empty() || subskill.is_empty() || name.is_empty() {
            return Ok(None);
        }
        let created = {
            let _guard = self.tracker.begin(Operation::Create);
            self.service.create_topic(subject, subskill, name).await
        };
        let stored = match created {
            Ok(topic) => self
                .store
                .write()
                .await
                .upsert_topic(subject, subskill, topic.clone())
                .map(|()| topic),
            Err(e) => Err(e),
        };
        match stored {
            Ok(topic) => {
                info!(subject, subskill, topic_id = %topic.id, "Topic added");
                Ok(Some(topic))
            }
            Err(e) => {
                warn!(subject, subskill, topic = name, error = %e, "Failed to add topic");
                self.set_error("Failed to add topic");
                Err(e)
            }
        }
    }

    /// Ask the service to retrain its model.
    pub async fn retrain(&self) -> CadenceResult<RetrainStatus> {
        let result = {
            let _guard = self.tracker.begin(Operation::Retrain);
            self.service.retrain().await
        };
        match result {
            Ok(status) => {
                info!(status = %status.status, "Retrain requested");
                Ok(status)
            }
            Err(e) => {
                warn!(error = %e, "Failed to retrain model");
                self.set_error("Failed to retrain model");
                Err(e)
            }
        }
    }

    /// Sort every stored topic into due buckets relative to `now`.
    pub async fn overview<Tz: TimeZone>(&self, now: DateTime<Tz>) -> DueBuckets<ScheduledTopic> {
        let store = self.store.read().await;
        categorize(store.topics().map(|view| view.to_owned()), now)
    }

    /// Topic count, average score and due count.
    pub async fn stats(&self) -> DashboardStats {
        let due_count = self.cache.read().await.len();
        let store = self.store.read().await;
        DashboardStats::compute(store.topics().map(|view| view.topic.performance), due_count)
    }

    /// Snapshot of the current due list.
    pub async fn recommendations(&self) -> Vec<Recommendation> {
        self.cache.read().await.entries().to_vec()
    }

    /// Shared handle to the topic store.
    pub fn store(&self) -> &Arc<RwLock<TopicStore>> {
        &self.store
    }

    /// The in-flight tracker.
    pub fn tracker(&self) -> &InFlightTracker {
        &self.tracker
    }

    /// The banner message, if any.
    pub fn error(&self) -> Option<String> {
        self.banner.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Clear the banner.
    pub fn dismiss_error(&self) {
        self.banner.lock().unwrap_or_else(|p| p.into_inner()).take();
    }

    fn set_error(&self, message: impl Into<String>) {
        *self.banner.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.into());
    }
}
