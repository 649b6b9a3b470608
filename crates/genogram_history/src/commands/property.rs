//! Property edits, base or per-layer.

use genogram_foundation::{EntityId, Result, Value};
use genogram_storage::Graph;

use crate::command::{Command, CommandId};

/// One slot written by a [`SetProperty`].
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyEntry {
    /// Entity owning the property.
    pub entity: EntityId,
    /// Property name.
    pub name: String,
    /// Layer to override on; `None` writes the base value.
    pub layer: Option<EntityId>,
    /// Value to write; `None` resets the slot.
    pub value: Option<Value>,
    was: Option<Option<Value>>,
}

impl PropertyEntry {
    /// Writes `value` to the base slot.
    #[must_use]
    pub fn base(entity: EntityId, name: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            entity,
            name: name.into(),
            layer: None,
            value,
            was: None,
        }
    }

    /// Writes `value` as an override on `layer`.
    #[must_use]
    pub fn layered(
        layer: EntityId,
        entity: EntityId,
        name: impl Into<String>,
        value: Option<Value>,
    ) -> Self {
        Self {
            layer: Some(layer),
            ..Self::base(entity, name, value)
        }
    }

    /// Value stored in the slot before the first apply.
    #[must_use]
    pub fn was(&self) -> Option<&Option<Value>> {
        self.was.as_ref()
    }

    fn same_slot(&self, other: &Self) -> bool {
        self.entity == other.entity && self.name == other.name && self.layer == other.layer
    }

    fn write(&self, graph: &mut Graph, value: Option<Value>) -> Result<Option<Value>> {
        match (self.layer, value) {
            (None, Some(value)) => graph.set_base(self.entity, &self.name, value),
            (None, None) => graph.reset_base(self.entity, &self.name),
            (Some(layer), Some(value)) => graph.set_override(layer, self.entity, &self.name, value),
            (Some(layer), None) => graph.reset_override(layer, self.entity, &self.name),
        }
    }
}

/// Sets or resets any number of property slots as one step.
///
/// Commands built with the same [`CommandId`] merge: slots already held
/// keep their original value and take the newest target, new slots are
/// appended.
#[derive(Debug)]
pub struct SetProperty {
    label: String,
    id: Option<CommandId>,
    entries: Vec<PropertyEntry>,
}

impl SetProperty {
    /// Creates a command over `entries`.
    #[must_use]
    pub fn new(label: impl Into<String>, entries: Vec<PropertyEntry>) -> Self {
        Self {
            label: label.into(),
            id: None,
            entries,
        }
    }

    /// Tags the command for coalescing.
    #[must_use]
    pub fn with_id(mut self, id: CommandId) -> Self {
        self.id = Some(id);
        self
    }

    /// The slots this command writes.
    #[must_use]
    pub fn entries(&self) -> &[PropertyEntry] {
        &self.entries
    }
}

impl Command for SetProperty {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn id(&self) -> Option<CommandId> {
        self.id
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        for entry in &mut self.entries {
            let previous = entry.write(graph, entry.value.clone())?;
            if entry.was.is_none() {
                entry.was = Some(previous);
            }
        }
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        for entry in self.entries.iter().rev() {
            let was = entry.was.clone().flatten();
            entry.write(graph, was)?;
        }
        Ok(())
    }

    fn merge_with(&mut self, other: &dyn Command) -> bool {
        let Some(other) = other.as_any().downcast_ref::<Self>() else {
            return false;
        };
        for incoming in &other.entries {
            match self.entries.iter_mut().find(|e| e.same_slot(incoming)) {
                Some(held) => held.value = incoming.value.clone(),
                None => self.entries.push(incoming.clone()),
            }
        }
        true
    }
}
