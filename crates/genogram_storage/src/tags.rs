//! The tag registry and tag lookups.
//!
//! The registry is the list of tags a diagram offers. Entities carry their
//! tags in the `tags` list property; membership is not checked against the
//! registry, so renaming a tag is a registry edit plus one property edit per
//! tagged entity.

use std::collections::BTreeSet;

use genogram_foundation::{EntityId, Value};

use crate::entity::Relational;
use crate::graph::Graph;
use crate::notify::Change;
use crate::schema::{self, TAGS};

impl Graph {
    /// The tag registry, sorted.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Replaces the tag registry, returning the previous one.
    pub fn set_tags(&mut self, tags: BTreeSet<String>) -> BTreeSet<String> {
        if tags == self.tags {
            return tags;
        }
        self.changes.push(Change::Tags);
        std::mem::replace(&mut self.tags, tags)
    }

    /// Tags attached to an entity, in stored order.
    #[must_use]
    pub fn entity_tags(&self, id: EntityId) -> Vec<String> {
        match self.base_value(id, TAGS) {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entities carrying `tag`, in id order.
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Vec<EntityId> {
        self.iter()
            .filter(|e| schema::find(e.kind(), TAGS).is_some())
            .map(Relational::id)
            .filter(|id| self.entity_tags(*id).iter().any(|t| t == tag))
            .collect()
    }
}
