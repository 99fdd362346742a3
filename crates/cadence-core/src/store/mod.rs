//! In-memory mirror of the subject → subskill → topic hierarchy.
//!
//! The store keeps the hierarchy in insertion order for display and an
//! id → path index so any topic can be found without walking the tree.
//! The only mutation entry points are [`TopicStore::replace_all`],
//! the `upsert_*` family and [`TopicStore::merge_topic_fields`].

mod fields;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{CadenceError, CadenceResult, ErrorCode};
use crate::schedule::Schedulable;
use crate::types::{SubjectTree, Topic, TopicId, TopicRef};

pub use fields::TopicFields;

/// A subject and its subskills.
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    name: String,
    subskills: Vec<Subskill>,
}

impl Subject {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subskills: Vec::new(),
        }
    }

    /// Subject name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subskills in insertion order.
    pub fn subskills(&self) -> &[Subskill] {
        &self.subskills
    }

    /// Look up a subskill by name.
    pub fn subskill(&self, name: &str) -> Option<&Subskill> {
        self.subskills.iter().find(|s| s.name == name)
    }
}

/// A subskill and its topics.
#[derive(Debug, Clone, PartialEq)]
pub struct Subskill {
    name: String,
    topics: Vec<Topic>,
}

impl Subskill {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topics: Vec::new(),
        }
    }

    /// Subskill name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Topics in insertion order.
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TopicPath {
    subject: usize,
    subskill: usize,
    topic: usize,
}

/// A topic together with the names of its owners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicView<'a> {
    pub subject: &'a str,
    pub subskill: &'a str,
    pub topic: &'a Topic,
}

impl TopicView<'_> {
    /// Detach from the store.
    pub fn to_owned(&self) -> ScheduledTopic {
        ScheduledTopic {
            subject: self.subject.to_string(),
            subskill: self.subskill.to_string(),
            topic: self.topic.clone(),
        }
    }
}

/// Owned copy of a [`TopicView`], safe to keep after the store lock is released.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledTopic {
    pub subject: String,
    pub subskill: String,
    pub topic: Topic,
}

impl Schedulable for TopicView<'_> {
    fn next_review(&self) -> Option<&DateTime<Utc>> {
        self.topic.next_review.as_ref()
    }
}

impl Schedulable for ScheduledTopic {
    fn next_review(&self) -> Option<&DateTime<Utc>> {
        self.topic.next_review.as_ref()
    }
}

/// Owned aggregate holding the hierarchy.
#[derive(Debug, Clone, Default)]
pub struct TopicStore {
    subjects: Vec<Subject>,
    index: HashMap<TopicId, TopicPath>,
}

impl TopicStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a full hierarchy.
    pub fn from_tree(tree: SubjectTree) -> Self {
        let mut store = Self::new();
        store.replace_all(tree);
        store
    }

    /// Replace everything with a freshly fetched hierarchy.
    ///
    /// Server-side deletions show up here and nowhere else. A topic id that
    /// appears under two subskills keeps its first position.
    pub fn replace_all(&mut self, tree: SubjectTree) {
        self.subjects.clear();
        self.index.clear();

        for subject_node in tree.subjects {
            let subject_idx = self.subject_slot(&subject_node.name);
            for subskill_node in subject_node.subskills {
                let subskill_idx = self.subskill_slot(subject_idx, &subskill_node.name);
                for topic in subskill_node.topics {
                    if let Some(existing) = self.index.get(&topic.id) {
                        if existing.subject != subject_idx || existing.subskill != subskill_idx {
                            warn!(topic_id = %topic.id, "Topic listed under two subskills, keeping the first");
                            continue;
                        }
                    }
                    self.put_topic(subject_idx, subskill_idx, topic);
                }
            }
        }

        info!(
            subjects = self.subjects.len(),
            topics = self.index.len(),
            "Topic store refreshed"
        );
    }

    /// Add a subject if it does not exist yet. Returns true if it was created.
    pub fn upsert_subject(&mut self, name: &str) -> bool {
        let before = self.subjects.len();
        self.subject_slot(name);
        self.subjects.len() > before
    }

    /// Add a subskill (and its subject) if missing. Returns true if the
    /// subskill was created.
    pub fn upsert_subskill(&mut self, subject: &str, name: &str) -> bool {
        let subject_idx = self.subject_slot(subject);
        let before = self.subjects[subject_idx].subskills.len();
        self.subskill_slot(subject_idx, name);
        self.subjects[subject_idx].subskills.len() > before
    }

    /// Insert or replace a topic under the given subject and subskill.
    ///
    /// Parents are created on demand. A topic already owned by a different
    /// subskill is rejected: a topic belongs to exactly one place.
    pub fn upsert_topic(&mut self, subject: &str, subskill: &str, topic: Topic) -> CadenceResult<()> {
        if let Some(current) = self.find_topic(&topic.id) {
            if current.subject != subject || current.subskill != subskill {
                return Err(CadenceError::Validation {
                    message: format!(
                        "Topic '{}' already belongs to {} / {}",
                        topic.id, current.subject, current.subskill
                    ),
                    code: ErrorCode::ValHierarchyConflict,
                    details: HashMap::from([
                        ("subject".to_string(), current.subject.to_string()),
                        ("subskill".to_string(), current.subskill.to_string()),
                    ]),
                    suggestion: None,
                });
            }
        }

        let subject_idx = self.subject_slot(subject);
        let subskill_idx = self.subskill_slot(subject_idx, subskill);
        self.put_topic(subject_idx, subskill_idx, topic);
        Ok(())
    }

    /// Find a topic and its owning path.
    pub fn find_topic(&self, id: &TopicId) -> Option<TopicView<'_>> {
        let path = self.index.get(id)?;
        let subject = &self.subjects[path.subject];
        let subskill = &subject.subskills[path.subskill];
        Some(TopicView {
            subject: &subject.name,
            subskill: &subskill.name,
            topic: &subskill.topics[path.topic],
        })
    }

    /// Find a topic from a caller reference, accepting either id field.
    pub fn find_by_ref(&self, topic: &TopicRef) -> Option<TopicView<'_>> {
        self.find_topic(topic.canonical_id()?)
    }

    /// Replace only the supplied fields on one topic.
    ///
    /// Name, id and position in the hierarchy are never touched.
    pub fn merge_topic_fields(&mut self, id: &TopicId, fields: &TopicFields) -> CadenceResult<()> {
        let path = *self
            .index
            .get(id)
            .ok_or_else(|| CadenceError::not_found(id.as_str()))?;

        let topic = &mut self.subjects[path.subject].subskills[path.subskill].topics[path.topic];
        fields.apply_to(topic);
        debug!(topic_id = %id, ?fields, "Merged topic fields");
        Ok(())
    }

    /// All topics, flattened, in display order.
    pub fn topics(&self) -> impl Iterator<Item = TopicView<'_>> {
        self.subjects.iter().flat_map(|subject| {
            subject.subskills.iter().flat_map(move |subskill| {
                subskill.topics.iter().map(move |topic| TopicView {
                    subject: &subject.name,
                    subskill: &subskill.name,
                    topic,
                })
            })
        })
    }

    /// Subjects in insertion order.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Look up a subject by name.
    pub fn subject(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the store holds no topics.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn subject_slot(&mut self, name: &str) -> usize {
        if let Some(idx) = self.subjects.iter().position(|s| s.name == name) {
            return idx;
        }
        self.subjects.push(Subject::new(name));
        self.subjects.len() - 1
    }

    fn subskill_slot(&mut self, subject_idx: usize, name: &str) -> usize {
        let subskills = &mut self.subjects[subject_idx].subskills;
        if let Some(idx) = subskills.iter().position(|s| s.name == name) {
            return idx;
        }
        subskills.push(Subskill::new(name));
        subskills.len() - 1
    }

    fn put_topic(&mut self, subject_idx: usize, subskill_idx: usize, topic: Topic) {
        let topics = &mut self.subjects[subject_idx].subskills[subskill_idx].topics;
        match self.index.get(&topic.id).copied() {
            Some(path) => topics[path.topic] = topic,
            None => {
                let path = TopicPath {
                    subject: subject_idx,
                    subskill: subskill_idx,
                    topic: topics.len(),
                };
                self.index.insert(topic.id.clone(), path);
                topics.push(topic);
            }
        }
    }
}
