//! Core types for cadence.

mod hierarchy;
mod recommendation;
pub mod timestamp;
mod topic;

pub use hierarchy::{SubjectNode, SubjectTree, SubskillNode};
pub use recommendation::{DueList, Recommendation};
pub use timestamp::parse_timestamp;
pub use topic::{Performance, Topic, TopicId, TopicRef};
