//! Layer activation, ordering, naming and geometry storage.

use std::collections::BTreeMap;

use genogram_foundation::{EntityId, Result};
use genogram_storage::{Graph, PropertyRow};

use crate::command::Command;

/// Activates or deactivates a layer.
#[derive(Debug)]
pub struct SetLayerActive {
    layer: EntityId,
    active: bool,
    was: Option<bool>,
}

impl SetLayerActive {
    /// Sets `layer` active or inactive.
    #[must_use]
    pub fn new(layer: EntityId, active: bool) -> Self {
        Self {
            layer,
            active,
            was: None,
        }
    }
}

impl Command for SetLayerActive {
    fn label(&self) -> String {
        if self.active {
            "Activate layer".to_string()
        } else {
            "Deactivate layer".to_string()
        }
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.set_layer_active(self.layer, self.active)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(active) = self.was {
            graph.set_layer_active(self.layer, active)?;
        }
        Ok(())
    }
}

/// Reorders every layer.
#[derive(Debug)]
pub struct SetLayerOrder {
    order: Vec<EntityId>,
    was: Option<Vec<EntityId>>,
}

impl SetLayerOrder {
    /// Gives `order[i]` order index `i`.
    #[must_use]
    pub fn new(order: Vec<EntityId>) -> Self {
        Self { order, was: None }
    }
}

impl Command for SetLayerOrder {
    fn label(&self) -> String {
        "Reorder layers".to_string()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.reorder_layers(&self.order)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(order) = &self.was {
            graph.reorder_layers(order)?;
        }
        Ok(())
    }
}

/// Renames a layer.
#[derive(Debug)]
pub struct RenameLayer {
    layer: EntityId,
    name: String,
    was: Option<String>,
}

impl RenameLayer {
    /// Renames `layer` to `name`.
    #[must_use]
    pub fn new(layer: EntityId, name: impl Into<String>) -> Self {
        Self {
            layer,
            name: name.into(),
            was: None,
        }
    }
}

impl Command for RenameLayer {
    fn label(&self) -> String {
        format!("Rename layer to \"{}\"", self.name)
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.rename_layer(self.layer, self.name.clone())?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(name) = &self.was {
            graph.rename_layer(self.layer, name.clone())?;
        }
        Ok(())
    }
}

/// Turns geometry storage on or off for a layer.
///
/// Turning it off strips the layer's geometry overrides; undo puts them back.
#[derive(Debug)]
pub struct SetLayerStoreGeometry {
    layer: EntityId,
    enabled: bool,
    was: Option<(bool, BTreeMap<EntityId, PropertyRow>)>,
}

impl SetLayerStoreGeometry {
    /// Sets the geometry flag of `layer`.
    #[must_use]
    pub fn new(layer: EntityId, enabled: bool) -> Self {
        Self {
            layer,
            enabled,
            was: None,
        }
    }
}

impl Command for SetLayerStoreGeometry {
    fn label(&self) -> String {
        "Set layer geometry storage".to_string()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.set_layer_store_geometry(self.layer, self.enabled)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some((enabled, stripped)) = &self.was {
            graph.set_layer_store_geometry(self.layer, *enabled)?;
            graph.merge_layer_overrides(self.layer, stripped)?;
        }
        Ok(())
    }
}
