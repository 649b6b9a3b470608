//! Reversible structural transitions.
//!
//! A [`Delta`] records the entities a structural edit touches as full
//! snapshots: `before` holds what the edit detaches, `after` what it attaches.
//! An id present on both sides is modified in place (detached, then
//! re-attached with new links). Applying and reverting are the same
//! transition run in opposite directions:
//!
//! 1. every `from` id must be live, otherwise the transition fails
//! 2. `from` entities detach in descending rank, so dependents go first
//! 3. `to` entities attach in ascending rank, so every target already exists
//! 4. override rows are restored last, once every layer is back
//!
//! A failing step restores the graph to its state before step 1.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use genogram_foundation::{EntityId, Error, Result};
use tracing::trace;

use crate::entity::Relational;
use crate::graph::{EntitySnapshot, Graph};

/// Before/after snapshots of one structural edit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delta {
    before: BTreeMap<EntityId, EntitySnapshot>,
    after: BTreeMap<EntityId, EntitySnapshot>,
}

impl Delta {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the pre-edit state of an entity the edit detaches.
    pub fn record_before(&mut self, snapshot: EntitySnapshot) {
        self.before.insert(snapshot.id(), snapshot);
    }

    /// Records the post-edit state of an entity the edit attaches.
    pub fn record_after(&mut self, snapshot: EntitySnapshot) {
        self.after.insert(snapshot.id(), snapshot);
    }

    /// Snapshots detached by applying.
    #[must_use]
    pub fn before(&self) -> &BTreeMap<EntityId, EntitySnapshot> {
        &self.before
    }

    /// Snapshots attached by applying.
    #[must_use]
    pub fn after(&self) -> &BTreeMap<EntityId, EntitySnapshot> {
        &self.after
    }

    /// Returns true if applying would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    /// Ids that applying removes outright.
    #[must_use]
    pub fn removed(&self) -> Vec<EntityId> {
        self.before
            .keys()
            .filter(|id| !self.after.contains_key(id))
            .copied()
            .collect()
    }

    /// Ids that applying creates.
    #[must_use]
    pub fn added(&self) -> Vec<EntityId> {
        self.after
            .keys()
            .filter(|id| !self.before.contains_key(id))
            .copied()
            .collect()
    }

    /// Ids that applying modifies in place.
    #[must_use]
    pub fn modified(&self) -> Vec<EntityId> {
        self.before
            .keys()
            .filter(|id| self.after.contains_key(id))
            .copied()
            .collect()
    }
}

impl Graph {
    /// Moves the graph from `delta.before` to `delta.after`.
    ///
    /// # Errors
    ///
    /// Returns `CascadeFailed` if an entity to detach is not live, or the
    /// first error of any step. The graph is unchanged on error.
    pub fn apply_delta(&mut self, delta: &Delta) -> Result<()> {
        trace!(
            removed = ?delta.removed(),
            added = ?delta.added(),
            modified = ?delta.modified(),
            "applying delta"
        );
        self.atomically(|g| g.transition(&delta.before, &delta.after))
    }

    /// Moves the graph from `delta.after` back to `delta.before`.
    ///
    /// # Errors
    ///
    /// See [`apply_delta`](Self::apply_delta).
    pub fn revert_delta(&mut self, delta: &Delta) -> Result<()> {
        trace!(
            restored = ?delta.removed(),
            dropped = ?delta.added(),
            "reverting delta"
        );
        self.atomically(|g| g.transition(&delta.after, &delta.before))
    }

    fn transition(
        &mut self,
        from: &BTreeMap<EntityId, EntitySnapshot>,
        to: &BTreeMap<EntityId, EntitySnapshot>,
    ) -> Result<()> {
        if let Some(missing) = from.keys().find(|id| !self.contains(**id)) {
            return Err(Error::cascade_failed(*missing));
        }
        if let Some(taken) = to
            .keys()
            .find(|id| !from.contains_key(id) && self.contains(**id))
        {
            return Err(Error::duplicate_id(*taken));
        }

        let mut detach: Vec<&EntitySnapshot> = from.values().collect();
        detach.sort_by_key(|s| (Reverse(s.entity.rank()), Reverse(s.id())));
        for snapshot in detach {
            self.remove(snapshot.id())?;
        }

        let mut attach: Vec<&EntitySnapshot> = to.values().collect();
        attach.sort_by_key(|s| (s.entity.rank(), s.id()));
        for snapshot in attach {
            self.attach(snapshot.clone())?;
        }

        for snapshot in to.values() {
            self.restore_overrides(snapshot.id(), &snapshot.overrides);
        }
        Ok(())
    }
}
