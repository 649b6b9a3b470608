//! Proposed entities.
//!
//! A proposed entity is live and resolvable but not yet accepted. Proposed
//! entities may reference committed ones; the reverse is forbidden, so a
//! committed subgraph never depends on anything that might be rejected.

use std::collections::BTreeSet;

use genogram_foundation::{EntityId, Error, Result};

use crate::entity::Relational;
use crate::graph::Graph;
use crate::notify::Change;

impl Graph {
    /// Returns true if the entity is live and proposed.
    #[must_use]
    pub fn is_proposed(&self, id: EntityId) -> bool {
        self.proposed.contains(&id)
    }

    /// Every proposed id, ascending.
    #[must_use]
    pub fn proposed_ids(&self) -> Vec<EntityId> {
        self.proposed.iter().copied().collect()
    }

    /// The proposed entity plus every proposed entity it transitively
    /// references. Empty if `id` is committed.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if `id` is not live.
    pub fn proposal_closure(&self, id: EntityId) -> Result<BTreeSet<EntityId>> {
        self.get(id)?;
        let mut closure = BTreeSet::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if !self.proposed.contains(&next) || !closure.insert(next) {
                continue;
            }
            if let Some(entity) = self.resolve(next) {
                pending.extend(entity.references().iter().map(|r| r.target));
            }
        }
        Ok(closure)
    }

    /// Commits a set of proposed entities.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if an id is not proposed, or if a
    /// committed entity would reference one still proposed. Nothing is
    /// changed on error.
    pub fn commit_proposed(&mut self, ids: &BTreeSet<EntityId>) -> Result<()> {
        for id in ids {
            if !self.proposed.contains(id) {
                return Err(Error::invariant(format!("{id} is not proposed")));
            }
            let entity = self.get(*id)?;
            if let Some(reference) = entity
                .references()
                .into_iter()
                .find(|r| self.proposed.contains(&r.target) && !ids.contains(&r.target))
            {
                return Err(Error::invariant(format!(
                    "committing {id} requires committing {}",
                    reference.target
                )));
            }
        }
        for id in ids {
            self.proposed.remove(id);
            self.changes.push(Change::Committed(*id));
        }
        Ok(())
    }

    /// Marks committed entities proposed again. Undoes
    /// [`commit_proposed`](Self::commit_proposed).
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if an id is already proposed, or if a
    /// committed entity outside `ids` depends on one of them. Nothing is
    /// changed on error.
    pub fn mark_proposed(&mut self, ids: &BTreeSet<EntityId>) -> Result<()> {
        for id in ids {
            if self.proposed.contains(id) {
                return Err(Error::invariant(format!("{id} is already proposed")));
            }
            let entity = self.get(*id)?;
            if let Some(dependent) = entity
                .dependents()
                .into_iter()
                .find(|d| !self.proposed.contains(d) && !ids.contains(d))
            {
                return Err(Error::invariant(format!(
                    "committed {dependent} depends on {id}"
                )));
            }
        }
        for id in ids {
            self.proposed.insert(*id);
            self.changes.push(Change::Uncommitted(*id));
        }
        Ok(())
    }
}
