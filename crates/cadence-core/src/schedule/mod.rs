//! Due-date categorization.
//!
//! A categorization pass captures `now` once in a [`ReviewWindow`] and
//! sorts every topic into exactly one [`DueBucket`]. Missing or malformed
//! review dates were already turned into `None` at ingestion and land in
//! `unscheduled`; nothing here can fail.

mod buckets;
mod window;

pub use buckets::{categorize, DueBuckets, Schedulable};
pub use window::{DueBucket, ReviewWindow};
