//! Commands that add and remove entities.
//!
//! All three are delta-based: the delta is worked out on first apply and
//! cached, so redo replays exactly the ids and links the first run produced.

use genogram_foundation::{EntityId, Result};
use genogram_storage::{Delta, EntitySnapshot, Graph};

use crate::cascade::{self, Scope};
use crate::command::Command;

/// Adds one entity, with its initial properties.
#[derive(Debug)]
pub struct AddEntity {
    label: String,
    delta: Delta,
}

impl AddEntity {
    /// Adds the entity captured in `snapshot`.
    #[must_use]
    pub fn new(label: impl Into<String>, snapshot: EntitySnapshot) -> Self {
        let mut delta = Delta::new();
        delta.record_after(snapshot);
        Self {
            label: label.into(),
            delta,
        }
    }

    /// The id of the added entity.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.delta.after().keys().next().copied()
    }
}

impl Command for AddEntity {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        graph.apply_delta(&self.delta)
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        graph.revert_delta(&self.delta)
    }
}

/// Removes entities and everything that depends on them.
#[derive(Debug)]
pub struct RemoveEntities {
    ids: Vec<EntityId>,
    delta: Option<Delta>,
}

impl RemoveEntities {
    /// Removes `ids` with their cascade.
    #[must_use]
    pub fn new(ids: Vec<EntityId>) -> Self {
        Self { ids, delta: None }
    }

    /// Removes `ids` using an already mapped cascade.
    #[must_use]
    pub fn mapped(ids: Vec<EntityId>, delta: Delta) -> Self {
        Self {
            ids,
            delta: Some(delta),
        }
    }

    /// The mapped removal, once applied.
    #[must_use]
    pub fn delta(&self) -> Option<&Delta> {
        self.delta.as_ref()
    }
}

impl Command for RemoveEntities {
    fn label(&self) -> String {
        match self.ids.len() {
            1 => "Remove item".to_string(),
            n => format!("Remove {n} items"),
        }
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let delta = match self.delta.take() {
            Some(delta) => delta,
            None => cascade::map_removal(graph, &self.ids, Scope::All)?,
        };
        let applied = graph.apply_delta(&delta);
        self.delta = Some(delta);
        applied
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        match &self.delta {
            Some(delta) => graph.revert_delta(delta),
            None => Ok(()),
        }
    }
}

/// Gives a person new parents, regrouping multiple births as needed.
#[derive(Debug)]
pub struct SetParents {
    person: EntityId,
    target: Option<EntityId>,
    delta: Option<Delta>,
}

impl SetParents {
    /// Points `person` at `target`; see [`Graph::plan_set_parents`].
    #[must_use]
    pub fn new(person: EntityId, target: Option<EntityId>) -> Self {
        Self {
            person,
            target,
            delta: None,
        }
    }
}

impl Command for SetParents {
    fn label(&self) -> String {
        match self.target {
            Some(_) => "Set parents".to_string(),
            None => "Remove parents".to_string(),
        }
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let delta = match self.delta.take() {
            Some(delta) => delta,
            None => graph.plan_set_parents(self.person, self.target)?,
        };
        let applied = graph.apply_delta(&delta);
        self.delta = Some(delta);
        applied
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        match &self.delta {
            Some(delta) => graph.revert_delta(delta),
            None => Ok(()),
        }
    }
}
