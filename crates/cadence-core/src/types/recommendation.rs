//! Due-list projection supplied by the scheduling service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::timestamp;
use super::topic::{optional_id, Performance, TopicId, TopicRef};
use crate::error::CadenceError;

/// A denormalized view of a topic that is due for review.
///
/// Never the system of record: the topic store is authoritative, this is
/// only what the service last said should be reviewed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecommendation", rename_all = "camelCase")]
pub struct Recommendation {
    /// Canonical topic id.
    pub topic_id: TopicId,
    /// Owning subject name.
    pub subject: String,
    /// Owning subskill name.
    pub subskill: String,
    /// Topic name.
    pub topic: String,
    /// Performance at the time of the projection.
    pub performance: Performance,
    /// Last review timestamp.
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Next review timestamp.
    pub next_review: Option<DateTime<Utc>>,
}

impl Recommendation {
    /// Create a recommendation with no review history.
    pub fn new(
        topic_id: TopicId,
        subject: impl Into<String>,
        subskill: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            topic_id,
            subject: subject.into(),
            subskill: subskill.into(),
            topic: topic.into(),
            performance: Performance::MIN,
            last_reviewed: None,
            next_review: None,
        }
    }

    /// Set the performance.
    pub fn with_performance(mut self, performance: Performance) -> Self {
        self.performance = performance;
        self
    }

    /// Set the next review timestamp.
    pub fn with_next_review(mut self, at: DateTime<Utc>) -> Self {
        self.next_review = Some(at);
        self
    }
}

impl From<&Recommendation> for TopicRef {
    fn from(rec: &Recommendation) -> Self {
        TopicRef::new(rec.topic_id.clone())
    }
}

#[derive(Debug, Deserialize)]
struct RawRecommendation {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<TopicId>,
    #[serde(default, rename = "topicId", alias = "topic_id", deserialize_with = "optional_id")]
    topic_id: Option<TopicId>,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    subskill: String,
    #[serde(default, alias = "name")]
    topic: String,
    #[serde(default)]
    performance: Performance,
    #[serde(default, rename = "lastReviewed", alias = "last_reviewed", deserialize_with = "timestamp::lenient")]
    last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, rename = "nextReview", alias = "next_review", deserialize_with = "timestamp::lenient")]
    next_review: Option<DateTime<Utc>>,
}

impl TryFrom<RawRecommendation> for Recommendation {
    type Error = CadenceError;

    fn try_from(raw: RawRecommendation) -> Result<Self, Self::Error> {
        let topic_id = TopicRef {
            id: raw.id,
            topic_id: raw.topic_id,
        }
        .into_canonical_id()
        .ok_or_else(|| {
            CadenceError::malformed(format!("recommendation '{}' has no topic id", raw.topic))
        })?;

        Ok(Self {
            topic_id,
            subject: raw.subject,
            subskill: raw.subskill,
            topic: raw.topic,
            performance: raw.performance,
            last_reviewed: raw.last_reviewed,
            next_review: raw.next_review,
        })
    }
}

/// The due list as served by `GET /api/recommendations`.
///
/// Entries without a usable id are dropped with a warning instead of failing
/// the whole list, the same way the hierarchy treats id-less topics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DueList(pub Vec<Recommendation>);

impl DueList {
    pub fn into_inner(self) -> Vec<Recommendation> {
        self.0
    }
}

impl<'de> Deserialize<'de> for DueList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawRecommendation>::deserialize(deserializer)?;
        let entries = raw
            .into_iter()
            .filter_map(|raw| match Recommendation::try_from(raw) {
                Ok(rec) => Some(rec),
                Err(e) => {
                    warn!(error = %e, "Dropping recommendation without id");
                    None
                }
            })
            .collect();
        Ok(Self(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_case_payload() {
        let rec: Recommendation = serde_json::from_str(
            r#"{
                "topicId": 11,
                "subject": "Math",
                "subskill": "Algebra",
                "topic": "Quadratics",
                "performance": 0.4,
                "lastReviewed": "2026-10-10T08:00:00Z",
                "nextReview": null
            }"#,
        )
        .unwrap();

        assert_eq!(rec.topic_id.as_str(), "11");
        assert_eq!(rec.topic, "Quadratics");
        assert!(rec.last_reviewed.is_some());
        assert!(rec.next_review.is_none());
    }

    #[test]
    fn test_legacy_id_and_snake_case() {
        let rec: Recommendation = serde_json::from_str(
            r#"{"id": "11", "subject": "Math", "subskill": "Algebra", "name": "Quadratics", "next_review": "2026-10-20"}"#,
        )
        .unwrap();

        assert_eq!(rec.topic_id.as_str(), "11");
        assert_eq!(rec.topic, "Quadratics");
        assert!(rec.next_review.is_some());
    }

    #[test]
    fn test_serializes_camel_case() {
        let rec = Recommendation::new(TopicId::from(5), "Math", "Algebra", "Quadratics");
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["topicId"], "5");
        assert!(json.get("lastReviewed").is_some());
    }

    #[test]
    fn test_missing_id_is_malformed() {
        assert!(serde_json::from_str::<Recommendation>(r#"{"topic": "x"}"#).is_err());
    }

    #[test]
    fn test_due_list_drops_entries_without_id() {
        let list: DueList = serde_json::from_str(
            r#"[
                {"topicId": 1, "topic": "Quadratics"},
                {"topic": "Orphan"},
                {"id": "2", "topic": "Vectors"}
            ]"#,
        )
        .unwrap();

        let ids: Vec<_> = list.0.iter().map(|r| r.topic_id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn test_due_list_still_rejects_non_array() {
        assert!(serde_json::from_str::<DueList>(r#"{"topicId": 1}"#).is_err());
    }
}
