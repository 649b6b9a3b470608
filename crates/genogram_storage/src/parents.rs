//! Parent assignment and multiple-birth grouping.
//!
//! A person's parents are a single [`ChildOf`] link pointing at a pair-bond,
//! or at a [`MultipleBirth`] group of that pair-bond. Choosing a sibling as
//! the target groups the two children: a sibling linked straight to the
//! pair-bond is promoted into a new group with the person, a sibling already
//! in a group gets the person appended. Leaving a group that would keep a
//! single member dissolves it and points the survivor back at the pair-bond.
//!
//! Planning produces a [`Delta`], so the whole regrouping applies and undoes
//! as one step.

use genogram_foundation::{EntityId, Error, Result};
use tracing::debug;

use crate::delta::Delta;
use crate::entity::{ChildOf, Entity, MultipleBirth, Relational};
use crate::graph::{EntitySnapshot, Graph};

/// Where a person's child link should end up.
struct Placement {
    target: EntityId,
    /// Sibling link to move into a new group: `(link, pair-bond)`.
    promote: Option<(EntityId, EntityId)>,
}

impl Graph {
    /// Works out the structural change that gives `person` new parents.
    ///
    /// `target` may be `None` (no parents), a pair-bond, a multiple birth, a
    /// sibling's child link, or a sibling. New ids are allocated here; nothing
    /// else changes until the delta is applied. Re-targeting the current
    /// parents yields an empty delta.
    ///
    /// # Errors
    ///
    /// Returns an error if `person` is not a person, if `target` has the
    /// wrong kind, or if a sibling target has no parents.
    pub fn plan_set_parents(
        &mut self,
        person: EntityId,
        target: Option<EntityId>,
    ) -> Result<Delta> {
        let current_link = self.person(person)?.child_of;
        let current_target = match current_link {
            Some(link) => Some(self.child_of(link)?.target),
            None => None,
        };
        let placement = match target {
            Some(target) => Some(self.placement(person, target)?),
            None => None,
        };
        if placement.as_ref().map(|p| p.target) == current_target
            && placement.as_ref().is_none_or(|p| p.promote.is_none())
        {
            return Ok(Delta::new());
        }

        let mut delta = Delta::new();
        let mut previous = None;
        if let Some(link) = current_link {
            let snapshot = self.snapshot(link)?;
            delta.record_before(snapshot.clone());
            previous = Some(snapshot);
            if let Some(group) = current_target {
                self.plan_leave_group(group, link, &mut delta)?;
            }
        }

        let Some(placement) = placement else {
            return Ok(delta);
        };
        let target = match placement.promote {
            Some((sibling_link, pair_bond)) => {
                let group = self.allocate_id();
                debug!(%group, %pair_bond, sibling = %sibling_link, "promoting sibling into multiple birth");
                delta.record_after(
                    EntitySnapshot::new(Entity::MultipleBirth(MultipleBirth::new(group, pair_bond)))
                        .with_proposed(self.proposed.contains(&pair_bond)),
                );
                let sibling = self.snapshot(sibling_link)?;
                delta.record_before(sibling.clone());
                delta.record_after(retarget(sibling, group));
                group
            }
            None => placement.target,
        };

        let linked = match previous {
            Some(snapshot) => retarget(snapshot, target),
            None => {
                let link = self.allocate_id();
                let proposed = self.proposed.contains(&person) || self.proposed.contains(&target);
                EntitySnapshot::new(Entity::ChildOf(ChildOf::new(link, person, target)))
                    .with_proposed(proposed)
            }
        };
        delta.record_after(linked);
        Ok(delta)
    }

    /// Plans and applies a parent change, returning the applied delta.
    ///
    /// # Errors
    ///
    /// See [`plan_set_parents`](Self::plan_set_parents) and
    /// [`apply_delta`](Self::apply_delta). The graph is unchanged on error.
    pub fn set_parents(&mut self, person: EntityId, target: Option<EntityId>) -> Result<Delta> {
        let delta = self.plan_set_parents(person, target)?;
        self.apply_delta(&delta)?;
        Ok(delta)
    }

    fn placement(&self, person: EntityId, target: EntityId) -> Result<Placement> {
        let sibling = match self.get(target)? {
            Entity::PairBond(_) | Entity::MultipleBirth(_) => {
                return Ok(Placement {
                    target,
                    promote: None,
                });
            }
            Entity::ChildOf(link) => link.person,
            Entity::Person(_) => target,
            other => {
                return Err(Error::wrong_kind(
                    target,
                    "pair_bond, multiple_birth, child_of or person",
                    other.kind(),
                ));
            }
        };
        if sibling == person {
            return Err(Error::invariant(format!(
                "{person} cannot be their own sibling"
            )));
        }
        let Some(sibling_link) = self.person(sibling)?.child_of else {
            return Err(Error::invariant(format!("{sibling} has no parents")));
        };
        let sibling_target = self.child_of(sibling_link)?.target;
        match self.get(sibling_target)? {
            Entity::PairBond(pb) => Ok(Placement {
                target: pb.id,
                promote: Some((sibling_link, pb.id)),
            }),
            _ => Ok(Placement {
                target: sibling_target,
                promote: None,
            }),
        }
    }

    /// Dissolves `group` if removing `leaving` would leave it with fewer than
    /// two members.
    fn plan_leave_group(&self, group: EntityId, leaving: EntityId, delta: &mut Delta) -> Result<()> {
        let Ok(mb) = self.multiple_birth(group) else {
            return Ok(());
        };
        let survivors: Vec<EntityId> = mb
            .child_ofs
            .iter()
            .copied()
            .filter(|link| *link != leaving)
            .collect();
        if survivors.len() >= 2 {
            return Ok(());
        }
        let pair_bond = mb.pair_bond;
        debug!(%group, %pair_bond, "dissolving multiple birth");
        delta.record_before(self.snapshot(group)?);
        for survivor in survivors {
            let snapshot = self.snapshot(survivor)?;
            delta.record_before(snapshot.clone());
            delta.record_after(retarget(snapshot, pair_bond));
        }
        Ok(())
    }
}

fn retarget(mut snapshot: EntitySnapshot, target: EntityId) -> EntitySnapshot {
    if let Entity::ChildOf(link) = &snapshot.entity {
        snapshot.entity = Entity::ChildOf(link.retargeted(target));
    }
    snapshot
}
