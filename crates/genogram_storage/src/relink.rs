//! In-place edits of forward references.
//!
//! Emotions can move between people and events between owners without being
//! removed: the entity keeps its id, properties and overrides, and only the
//! back-reference sets of the old and new targets change.

use genogram_foundation::{EntityId, Result};

use crate::entity::{Entity, Relational};
use crate::graph::Graph;
use crate::notify::Change;

impl Graph {
    /// Points an emotion at new endpoints, returning the previous ones.
    ///
    /// # Errors
    ///
    /// Returns an error if `emotion` is not an emotion, or `InvariantViolation`
    /// if the endpoints are missing, not people, or do not fit the
    /// relationship's arity. Nothing is changed on error.
    pub fn set_emotion_people(
        &mut self,
        emotion: EntityId,
        person_a: EntityId,
        person_b: Option<EntityId>,
    ) -> Result<(EntityId, Option<EntityId>)> {
        let mut updated = self.emotion(emotion)?.clone();
        let previous = updated.people();
        updated.person_a = person_a;
        updated.person_b = person_b;
        self.relink(Entity::Emotion(updated))?;
        Ok(previous)
    }

    /// Moves an event to another owner, returning the previous owner.
    ///
    /// # Errors
    ///
    /// Returns an error if `event` is not an event, or `InvariantViolation` if
    /// the new owner cannot hold this event kind or already holds a built-in
    /// event of the same kind. Nothing is changed on error.
    pub fn set_event_parent(&mut self, event: EntityId, parent: EntityId) -> Result<EntityId> {
        let mut updated = self.event(event)?.clone();
        let previous = updated.parent;
        updated.parent = parent;
        self.relink(Entity::Event(updated))?;
        Ok(previous)
    }

    fn relink(&mut self, updated: Entity) -> Result<()> {
        let id = updated.id();
        let proposed = self.proposed.contains(&id);
        self.check_references(&updated, proposed)?;
        self.check_shape(&updated)?;

        let kind = updated.kind();
        let old = self.get(id)?.references();
        for reference in old {
            if let Some(target) = self.entities.get_mut(&reference.target) {
                target.detach_dependent(id);
            }
        }
        for reference in updated.references() {
            if let Some(target) = self.entities.get_mut(&reference.target) {
                target.attach_dependent(kind, id);
            }
        }
        self.entities.insert(id, updated);
        self.changes.push(Change::Relinked(id));
        Ok(())
    }
}
