//! cadence-core - Core library for cadence.
//!
//! Client-side state for a spaced-repetition tracker: the subject/subskill/topic
//! hierarchy, due-date categorization, the recommendation cache, and the
//! reconciler that folds scheduling-service answers back into local state.
//!
//! # Example
//!
//! ```ignore
//! use cadence_core::{Dashboard, Performance, TopicRef, TopicId};
//!
//! let dashboard = Dashboard::new(service);
//! dashboard.load().await?;
//!
//! let outcome = dashboard
//!     .update_performance(&TopicRef::new(TopicId::from(7)), Performance::clamped(0.8))
//!     .await?;
//! let buckets = dashboard.overview(chrono::Local::now()).await;
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod recommendations;
pub mod reconciler;
pub mod schedule;
pub mod store;
pub mod tracker;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, DashboardStats, ReviewAction};
pub use error::{CadenceError, CadenceResult, ErrorCode};
pub use recommendations::RecommendationCache;
pub use reconciler::{PerformanceReconciler, ReconcileOutcome, ReconcilePolicy};
pub use schedule::{categorize, DueBucket, DueBuckets, ReviewWindow, Schedulable};
pub use store::{ScheduledTopic, Subject, Subskill, TopicFields, TopicStore, TopicView};
pub use tracker::{InFlightGuard, InFlightTracker, Operation};
pub use traits::{RetrainStatus, ScheduleService, ScheduleUpdate};
pub use types::{
    DueList, Performance, Recommendation, SubjectNode, SubjectTree, SubskillNode, Topic, TopicId,
    TopicRef,
};
