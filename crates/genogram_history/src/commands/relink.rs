//! Moving emotions and events between owners.

use genogram_foundation::{EntityId, Result};
use genogram_storage::Graph;

use crate::command::Command;

/// Points an emotion at other people.
#[derive(Debug)]
pub struct SetEmotionPeople {
    emotion: EntityId,
    people: (EntityId, Option<EntityId>),
    was: Option<(EntityId, Option<EntityId>)>,
}

impl SetEmotionPeople {
    /// Moves `emotion` onto `person_a` and, for dyadic kinds, `person_b`.
    #[must_use]
    pub fn new(emotion: EntityId, person_a: EntityId, person_b: Option<EntityId>) -> Self {
        Self {
            emotion,
            people: (person_a, person_b),
            was: None,
        }
    }
}

impl Command for SetEmotionPeople {
    fn label(&self) -> String {
        "Set emotion people".to_string()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let (a, b) = self.people;
        let previous = graph.set_emotion_people(self.emotion, a, b)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some((a, b)) = self.was {
            graph.set_emotion_people(self.emotion, a, b)?;
        }
        Ok(())
    }
}

/// Moves an event to another owner.
#[derive(Debug)]
pub struct SetEventParent {
    event: EntityId,
    parent: EntityId,
    was: Option<EntityId>,
}

impl SetEventParent {
    /// Moves `event` under `parent`.
    #[must_use]
    pub fn new(event: EntityId, parent: EntityId) -> Self {
        Self {
            event,
            parent,
            was: None,
        }
    }
}

impl Command for SetEventParent {
    fn label(&self) -> String {
        "Set event parent".to_string()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.set_event_parent(self.event, self.parent)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(parent) = self.was {
            graph.set_event_parent(self.event, parent)?;
        }
        Ok(())
    }
}
