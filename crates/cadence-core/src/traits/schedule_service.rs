//! Scheduling service trait and its response types.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CadenceError, CadenceResult};
use crate::types::{timestamp, Performance, Recommendation, SubjectTree, Topic, TopicId};

/// The remote service that owns spaced-repetition scheduling and storage.
///
/// The dashboard never computes half-lives or review dates itself; it only
/// talks to an implementation of this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleService: Send + Sync {
    /// Fetch the full subject → subskill → topic hierarchy.
    async fn fetch_subjects(&self) -> CadenceResult<SubjectTree>;

    /// Fetch the topics currently due for review.
    async fn fetch_recommendations(&self) -> CadenceResult<Vec<Recommendation>>;

    /// Record a performance score and get the authoritative schedule back.
    async fn schedule(
        &self,
        topic_id: &TopicId,
        performance: Performance,
    ) -> CadenceResult<ScheduleUpdate>;

    /// Create a subject.
    async fn create_subject(&self, name: &str) -> CadenceResult<()>;

    /// Create a subskill under an existing subject.
    async fn create_subskill(&self, subject: &str, name: &str) -> CadenceResult<()>;

    /// Create a topic under an existing subskill, returning the stored topic.
    async fn create_topic(&self, subject: &str, subskill: &str, name: &str) -> CadenceResult<Topic>;

    /// Ask the service to retrain its scheduling model.
    async fn retrain(&self) -> CadenceResult<RetrainStatus>;
}

/// Authoritative schedule returned after a performance update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScheduleUpdate")]
pub struct ScheduleUpdate {
    /// When the topic should be reviewed next.
    pub next_review: DateTime<Utc>,
    /// Estimated half-life in days.
    pub halflife: f64,
}

#[derive(Deserialize)]
struct RawScheduleUpdate {
    #[serde(default, alias = "nextReview", deserialize_with = "timestamp::lenient")]
    next_review: Option<DateTime<Utc>>,
    #[serde(default)]
    halflife: Option<f64>,
}

impl TryFrom<RawScheduleUpdate> for ScheduleUpdate {
    type Error = CadenceError;

    fn try_from(raw: RawScheduleUpdate) -> Result<Self, Self::Error> {
        let next_review = raw.next_review.ok_or_else(|| {
            CadenceError::missing_field("schedule response has no usable next_review")
        })?;
        let halflife = raw
            .halflife
            .filter(|h| h.is_finite() && *h > 0.0)
            .ok_or_else(|| {
                CadenceError::missing_field("schedule response has no positive halflife")
            })?;

        Ok(Self {
            next_review,
            halflife,
        })
    }
}

/// Status object returned by a retrain request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrainStatus {
    /// Human-readable status line.
    #[serde(default)]
    pub status: String,
    /// Anything else the service chose to include.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
