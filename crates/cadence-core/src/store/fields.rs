//! Partial topic updates.

use chrono::{DateTime, Utc};

use crate::traits::ScheduleUpdate;
use crate::types::{Performance, Topic};

/// The subset of topic fields a merge may replace.
///
/// `None` means "not supplied": the current value is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicFields {
    pub performance: Option<Performance>,
    pub next_review: Option<DateTime<Utc>>,
    pub halflife: Option<f64>,
}

impl TopicFields {
    /// Fields confirmed by the service after a performance update.
    pub fn from_schedule(performance: Performance, update: &ScheduleUpdate) -> Self {
        Self {
            performance: Some(performance),
            next_review: Some(update.next_review),
            halflife: Some(update.halflife),
        }
    }

    /// Only the performance.
    pub fn performance(performance: Performance) -> Self {
        Self {
            performance: Some(performance),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(&self, topic: &mut Topic) {
        if let Some(performance) = self.performance {
            topic.performance = performance;
        }
        if let Some(next_review) = self.next_review {
            topic.next_review = Some(next_review);
        }
        if let Some(halflife) = self.halflife {
            topic.halflife = Some(halflife);
        }
    }
}
