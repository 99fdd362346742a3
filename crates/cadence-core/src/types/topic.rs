//! Topic types and identifier normalization.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::timestamp;
use crate::error::{CadenceError, CadenceResult, ErrorCode};

/// Canonical topic identifier.
///
/// The service emits ids as numbers in some payloads and strings in others;
/// both collapse to the same string form so lookups never depend on the
/// wire representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    /// Create an id from a non-empty string.
    pub fn parse(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for TopicId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// Either wire form of an id.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl WireId {
    fn normalize(self) -> Option<TopicId> {
        match self {
            WireId::Text(raw) => TopicId::parse(raw),
            WireId::Signed(n) => Some(TopicId(n.to_string())),
            WireId::Unsigned(n) => Some(TopicId(n.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TopicId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        WireId::deserialize(deserializer)?
            .normalize()
            .ok_or_else(|| serde::de::Error::custom("topic id must not be empty"))
    }
}

/// Deserialize an optional id; `null`, empty strings and unexpected shapes
/// become `None`.
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<TopicId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| WireId::deserialize(v).ok()).and_then(WireId::normalize))
}

/// Performance score, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Performance(f64);

impl Performance {
    /// Lowest score.
    pub const MIN: Self = Self(0.0);
    /// Highest score.
    pub const MAX: Self = Self(1.0);
    /// Increment used by the "good" / "needs improvement" review actions.
    pub const STEP: f64 = 0.1;

    /// Create a score, rejecting values outside `[0, 1]`.
    pub fn new(value: f64) -> CadenceResult<Self> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(CadenceError::Validation {
                message: format!("Performance must be within [0, 1], got {}", value),
                code: ErrorCode::ValInvalidPerformance,
                details: Default::default(),
                suggestion: Some("Use Performance::clamped for untrusted input".to_string()),
            });
        }
        Ok(Self(value))
    }

    /// Create a score, clamping into `[0, 1]`. NaN becomes 0.
    pub fn clamped(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Raw value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// One step better, capped at 1.
    pub fn step_up(self) -> Self {
        Self::clamped(self.0 + Self::STEP)
    }

    /// One step worse, floored at 0.
    pub fn step_down(self) -> Self {
        Self::clamped(self.0 - Self::STEP)
    }

    /// Rounded percentage for display.
    pub fn as_percent(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl<'de> Deserialize<'de> for Performance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<f64>::deserialize(deserializer)?;
        Ok(raw.map(Self::clamped).unwrap_or_default())
    }
}

fn positive_halflife<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|v| v.as_f64())
        .filter(|h| h.is_finite() && *h > 0.0))
}

/// A single unit of study material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTopic")]
pub struct Topic {
    /// Canonical identifier.
    pub id: TopicId,
    /// Display label.
    pub name: String,
    /// Latest recorded performance.
    pub performance: Performance,
    /// Last review, absent if never reviewed.
    pub last_reviewed: Option<DateTime<Utc>>,
    /// Server-predicted next review, absent if not yet scheduled.
    pub next_review: Option<DateTime<Utc>>,
    /// Server-estimated half-life in days.
    pub halflife: Option<f64>,
}

impl Topic {
    /// Create an unreviewed, unscheduled topic.
    pub fn new(id: TopicId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            performance: Performance::MIN,
            last_reviewed: None,
            next_review: None,
            halflife: None,
        }
    }

    /// Set the performance.
    pub fn with_performance(mut self, performance: Performance) -> Self {
        self.performance = performance;
        self
    }

    /// Set the last review timestamp.
    pub fn with_last_reviewed(mut self, at: DateTime<Utc>) -> Self {
        self.last_reviewed = Some(at);
        self
    }

    /// Set the next review timestamp.
    pub fn with_next_review(mut self, at: DateTime<Utc>) -> Self {
        self.next_review = Some(at);
        self
    }

    /// Set the half-life.
    pub fn with_halflife(mut self, days: f64) -> Self {
        self.halflife = Some(days);
        self
    }
}

/// Topic as it appears on the wire, with both legacy id names.
#[derive(Debug, Deserialize)]
pub(crate) struct RawTopic {
    #[serde(default, deserialize_with = "optional_id")]
    id: Option<TopicId>,
    #[serde(default, rename = "topicId", alias = "topic_id", deserialize_with = "optional_id")]
    topic_id: Option<TopicId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    performance: Performance,
    #[serde(default, alias = "lastReviewed", deserialize_with = "timestamp::lenient")]
    last_reviewed: Option<DateTime<Utc>>,
    #[serde(default, alias = "nextReview", deserialize_with = "timestamp::lenient")]
    next_review: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "positive_halflife")]
    halflife: Option<f64>,
}

impl TryFrom<RawTopic> for Topic {
    type Error = CadenceError;

    fn try_from(raw: RawTopic) -> Result<Self, Self::Error> {
        let id = TopicRef {
            id: raw.id,
            topic_id: raw.topic_id,
        }
        .into_canonical_id()
        .ok_or_else(|| CadenceError::malformed(format!("topic '{}' has no id", raw.name)))?;

        Ok(Self {
            id,
            name: raw.name,
            performance: raw.performance,
            last_reviewed: raw.last_reviewed,
            next_review: raw.next_review,
            halflife: raw.halflife,
        })
    }
}

/// A caller's handle on a topic, as passed in from a view.
///
/// Older payloads carry the identifier as `id`, newer ones as `topicId`;
/// [`TopicRef::canonical_id`] is the only place that choice is made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "optional_id")]
    pub id: Option<TopicId>,
    #[serde(
        default,
        rename = "topicId",
        alias = "topic_id",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_id"
    )]
    pub topic_id: Option<TopicId>,
}

impl TopicRef {
    /// Reference carrying the current id field.
    pub fn new(topic_id: TopicId) -> Self {
        Self {
            id: None,
            topic_id: Some(topic_id),
        }
    }

    /// Reference carrying only the legacy `id` field.
    pub fn legacy(id: TopicId) -> Self {
        Self {
            id: Some(id),
            topic_id: None,
        }
    }

    /// Resolve the canonical id: `topicId` first, then `id`.
    pub fn canonical_id(&self) -> Option<&TopicId> {
        self.topic_id.as_ref().or(self.id.as_ref())
    }

    /// Owned variant of [`canonical_id`](Self::canonical_id).
    pub fn into_canonical_id(self) -> Option<TopicId> {
        self.topic_id.or(self.id)
    }
}

impl From<TopicId> for TopicRef {
    fn from(id: TopicId) -> Self {
        Self::new(id)
    }
}

impl From<&Topic> for TopicRef {
    fn from(topic: &Topic) -> Self {
        Self::new(topic.id.clone())
    }
}
