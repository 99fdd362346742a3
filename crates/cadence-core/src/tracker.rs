//! Per-operation in-flight tracking.
//!
//! Each service call holds an [`InFlightGuard`] for its duration. The guard
//! releases on drop, so error paths cannot leave an operation marked as
//! running. Several updates for the same topic are counted separately.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::types::TopicId;

/// A kind of service call worth showing progress for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    LoadSubjects,
    LoadRecommendations,
    Schedule(TopicId),
    Create,
    Retrain,
}

/// Shared table of running operations.
#[derive(Debug, Clone, Default)]
pub struct InFlightTracker {
    active: Arc<Mutex<HashMap<Operation, usize>>>,
}

impl InFlightTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an operation as started until the returned guard is dropped.
    pub fn begin(&self, operation: Operation) -> InFlightGuard {
        *lock(&self.active).entry(operation.clone()).or_insert(0) += 1;
        InFlightGuard {
            active: Arc::clone(&self.active),
            operation,
        }
    }

    /// Whether at least one instance of the operation is running.
    pub fn is_active(&self, operation: &Operation) -> bool {
        lock(&self.active).contains_key(operation)
    }

    /// Whether the subject hierarchy is being fetched.
    pub fn is_loading_subjects(&self) -> bool {
        self.is_active(&Operation::LoadSubjects)
    }

    /// Number of schedule requests outstanding for a topic.
    pub fn pending_reviews(&self, topic_id: &TopicId) -> usize {
        lock(&self.active)
            .get(&Operation::Schedule(topic_id.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Total running operations.
    pub fn active_count(&self) -> usize {
        lock(&self.active).values().sum()
    }

    /// True when nothing is running.
    pub fn is_idle(&self) -> bool {
        lock(&self.active).is_empty()
    }
}

/// Marks one running operation; releases it on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<Mutex<HashMap<Operation, usize>>>,
    operation: Operation,
}

impl InFlightGuard {
    /// The tracked operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut active = lock(&self.active);
        if let Some(count) = active.get_mut(&self.operation) {
            *count -= 1;
            if *count == 0 {
                active.remove(&self.operation);
            }
        }
    }
}

// A panic while holding the lock leaves the counts intact.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let tracker = InFlightTracker::new();
        {
            let _guard = tracker.begin(Operation::LoadSubjects);
            assert!(tracker.is_loading_subjects());
            assert!(!tracker.is_idle());
        }
        assert!(!tracker.is_loading_subjects());
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_concurrent_reviews_are_counted_per_topic() {
        let tracker = InFlightTracker::new();
        let a = TopicId::from(1);
        let b = TopicId::from(2);

        let first = tracker.begin(Operation::Schedule(a.clone()));
        let second = tracker.begin(Operation::Schedule(a.clone()));
        let other = tracker.begin(Operation::Schedule(b.clone()));
        assert_eq!(tracker.pending_reviews(&a), 2);
        assert_eq!(tracker.active_count(), 3);

        drop(first);
        assert_eq!(tracker.pending_reviews(&a), 1);
        assert!(tracker.is_active(&Operation::Schedule(a.clone())));

        drop(second);
        drop(other);
        assert_eq!(tracker.pending_reviews(&a), 0);
        assert!(tracker.is_idle());
    }

    #[test]
    fn test_clones_share_state() {
        let tracker = InFlightTracker::new();
        let view = tracker.clone();
        let guard = tracker.begin(Operation::Retrain);
        assert_eq!(guard.operation(), &Operation::Retrain);
        assert!(view.is_active(&Operation::Retrain));
    }
}
