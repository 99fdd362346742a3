//! Wire form of the full subject → subskill → topic hierarchy.
//!
//! `GET /api/subjects` answers with nested JSON objects keyed by name. The
//! order the server writes them in is the display order, so the maps are
//! read entry by entry instead of through a sorted or hashed map.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::topic::{RawTopic, Topic};

/// Full hierarchy as returned by the service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectTree {
    /// Subjects in server order.
    pub subjects: Vec<SubjectNode>,
}

/// One subject and its subskills.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectNode {
    pub name: String,
    pub subskills: Vec<SubskillNode>,
}

/// One subskill and its topics.
#[derive(Debug, Clone, PartialEq)]
pub struct SubskillNode {
    pub name: String,
    pub topics: Vec<Topic>,
}

impl SubjectTree {
    /// Total number of topics across all subjects.
    pub fn topic_count(&self) -> usize {
        self.subjects
            .iter()
            .flat_map(|s| &s.subskills)
            .map(|k| k.topics.len())
            .sum()
    }
}

/// JSON object read as an ordered list of entries.
struct Ordered<V>(Vec<(String, V)>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object keyed by name")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry::<String, V>()? {
                    entries.push(entry);
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

impl<'de> Deserialize<'de> for SubjectTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Ordered::<Ordered<Vec<RawTopic>>>::deserialize(deserializer)?;

        let subjects = raw
            .0
            .into_iter()
            .map(|(subject, subskills)| SubjectNode {
                subskills: subskills
                    .0
                    .into_iter()
                    .map(|(subskill, topics)| SubskillNode {
                        topics: topics
                            .into_iter()
                            .filter_map(|raw| match Topic::try_from(raw) {
                                Ok(topic) => Some(topic),
                                Err(e) => {
                                    warn!(%subject, %subskill, error = %e, "Dropping topic without id");
                                    None
                                }
                            })
                            .collect(),
                        name: subskill,
                    })
                    .collect(),
                name: subject,
            })
            .collect();

        Ok(Self { subjects })
    }
}
