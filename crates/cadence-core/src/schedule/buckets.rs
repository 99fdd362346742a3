//! Partitioning topics into due buckets.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::window::{DueBucket, ReviewWindow};
use crate::types::{Recommendation, Topic};

/// Anything with an optional next-review instant.
pub trait Schedulable {
    /// When the item should be reviewed next, if scheduled.
    fn next_review(&self) -> Option<&DateTime<Utc>>;
}

impl Schedulable for Topic {
    fn next_review(&self) -> Option<&DateTime<Utc>> {
        self.next_review.as_ref()
    }
}

impl Schedulable for Recommendation {
    fn next_review(&self) -> Option<&DateTime<Utc>> {
        self.next_review.as_ref()
    }
}

impl<T: Schedulable + ?Sized> Schedulable for &T {
    fn next_review(&self) -> Option<&DateTime<Utc>> {
        (**self).next_review()
    }
}

/// Result of a categorization pass. Every input lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueBuckets<T> {
    pub overdue: Vec<T>,
    pub today: Vec<T>,
    pub tomorrow: Vec<T>,
    pub this_week: Vec<T>,
    pub later: Vec<T>,
    pub unscheduled: Vec<T>,
}

impl<T> Default for DueBuckets<T> {
    fn default() -> Self {
        Self {
            overdue: Vec::new(),
            today: Vec::new(),
            tomorrow: Vec::new(),
            this_week: Vec::new(),
            later: Vec::new(),
            unscheduled: Vec::new(),
        }
    }
}

impl<T> DueBuckets<T> {
    /// Items in one bucket.
    pub fn bucket(&self, bucket: DueBucket) -> &[T] {
        match bucket {
            DueBucket::Overdue => &self.overdue,
            DueBucket::Today => &self.today,
            DueBucket::Tomorrow => &self.tomorrow,
            DueBucket::ThisWeek => &self.this_week,
            DueBucket::Later => &self.later,
            DueBucket::Unscheduled => &self.unscheduled,
        }
    }

    fn bucket_mut(&mut self, bucket: DueBucket) -> &mut Vec<T> {
        match bucket {
            DueBucket::Overdue => &mut self.overdue,
            DueBucket::Today => &mut self.today,
            DueBucket::Tomorrow => &mut self.tomorrow,
            DueBucket::ThisWeek => &mut self.this_week,
            DueBucket::Later => &mut self.later,
            DueBucket::Unscheduled => &mut self.unscheduled,
        }
    }

    /// Buckets in display order, including empty ones.
    pub fn iter(&self) -> impl Iterator<Item = (DueBucket, &[T])> {
        [
            DueBucket::Overdue,
            DueBucket::Today,
            DueBucket::Tomorrow,
            DueBucket::ThisWeek,
            DueBucket::Later,
            DueBucket::Unscheduled,
        ]
        .into_iter()
        .map(move |b| (b, self.bucket(b)))
    }

    /// Total number of items across all buckets.
    pub fn len(&self) -> usize {
        self.iter().map(|(_, items)| items.len()).sum()
    }

    /// True when there is nothing to show at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items in one bucket.
    pub fn count(&self, bucket: DueBucket) -> usize {
        self.bucket(bucket).len()
    }
}

impl<Tz: TimeZone> ReviewWindow<Tz> {
    /// Partition items against this window.
    pub fn categorize<T, I>(&self, items: I) -> DueBuckets<T>
    where
        T: Schedulable,
        I: IntoIterator<Item = T>,
    {
        let mut buckets = DueBuckets::default();
        for item in items {
            let bucket = self.classify(item.next_review());
            buckets.bucket_mut(bucket).push(item);
        }
        buckets
    }
}

/// Partition items into due buckets relative to a single captured `now`.
///
/// Pure: the same items and the same `now` always produce the same buckets.
pub fn categorize<T, I, Tz>(items: I, now: DateTime<Tz>) -> DueBuckets<T>
where
    T: Schedulable,
    I: IntoIterator<Item = T>,
    Tz: TimeZone,
{
    ReviewWindow::new(now).categorize(items)
}
