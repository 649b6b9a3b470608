//! Layer ordering, activation, and geometry storage.

use std::collections::BTreeMap;

use genogram_foundation::{EntityId, Error, Result, Value};

use crate::entity::Layer;
use crate::graph::Graph;
use crate::notify::Change;
use crate::property::PropertyRow;
use crate::schema::{ITEM_POS, SIZE};

impl Graph {
    /// Every live layer, ascending by order index.
    #[must_use]
    pub fn layers(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self
            .layer_ids
            .iter()
            .filter_map(|id| self.layer(*id).ok())
            .collect();
        layers.sort_by_key(|layer| (layer.order, layer.id));
        layers
    }

    /// Active layers, ascending by order index. The last one wins ties.
    #[must_use]
    pub fn active_layers(&self) -> Vec<&Layer> {
        self.layers().into_iter().filter(|l| l.active).collect()
    }

    /// Order index the next new layer should take.
    #[must_use]
    pub fn next_layer_order(&self) -> u32 {
        u32::try_from(self.layer_ids.len()).unwrap_or(u32::MAX)
    }

    fn overridden_slots(&self, layers: &[EntityId]) -> Vec<(EntityId, String)> {
        let mut slots = Vec::new();
        for layer_id in layers {
            if let Ok(layer) = self.layer(*layer_id) {
                for (entity, row) in &layer.overrides {
                    slots.extend(row.keys().map(|name| (*entity, name.clone())));
                }
            }
        }
        slots.sort();
        slots.dedup();
        slots
    }

    fn resolve_slots(&self, slots: &[(EntityId, String)]) -> Vec<Value> {
        slots
            .iter()
            .map(|(entity, name)| self.property(*entity, name).unwrap_or_default())
            .collect()
    }

    fn notify_slots(&mut self, slots: &[(EntityId, String)], before: &[Value]) {
        for ((entity, name), value) in slots.iter().zip(before) {
            self.notify_if_changed(*entity, name, value);
        }
    }

    /// Activates or deactivates a layer, returning the previous state.
    ///
    /// Every slot the layer overrides is re-resolved and a property change is
    /// queued for each one whose value moved.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn set_layer_active(&mut self, layer: EntityId, active: bool) -> Result<bool> {
        let previous = self.layer(layer)?.active;
        if previous == active {
            return Ok(previous);
        }
        let slots = self.overridden_slots(&[layer]);
        let before = self.resolve_slots(&slots);
        self.layer_mut(layer)?.active = active;
        self.changes.push(Change::LayerActivation { layer, active });
        self.notify_slots(&slots, &before);
        Ok(previous)
    }

    /// Reassigns order indices so that `order[i]` gets index `i`.
    ///
    /// Returns the previous order.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` unless `order` is a permutation of every
    /// live layer.
    pub fn reorder_layers(&mut self, order: &[EntityId]) -> Result<Vec<EntityId>> {
        let previous: Vec<EntityId> = self.layers().iter().map(|l| l.id).collect();
        let mut requested = order.to_vec();
        requested.sort();
        let mut current = previous.clone();
        current.sort();
        if requested != current {
            return Err(Error::invariant(
                "layer order must list every layer exactly once",
            ));
        }
        let active: Vec<EntityId> = self.active_layers().iter().map(|l| l.id).collect();
        let slots = self.overridden_slots(&active);
        let before = self.resolve_slots(&slots);
        for (index, id) in order.iter().enumerate() {
            let index = u32::try_from(index).map_err(|_| Error::invariant("too many layers"))?;
            let layer = self.layer_mut(*id)?;
            if layer.order != index {
                layer.order = index;
                self.changes.push(Change::LayerChanged(*id));
            }
        }
        self.notify_slots(&slots, &before);
        Ok(previous)
    }

    /// Renames a layer, returning the previous name.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn rename_layer(&mut self, layer: EntityId, name: impl Into<String>) -> Result<String> {
        let previous = std::mem::replace(&mut self.layer_mut(layer)?.name, name.into());
        self.changes.push(Change::LayerChanged(layer));
        Ok(previous)
    }

    /// Sets whether a layer stores geometry.
    ///
    /// Turning it off strips every `item_pos` and `size` override from the
    /// layer; the stripped rows are returned with the previous flag so the
    /// change can be undone.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn set_layer_store_geometry(
        &mut self,
        layer: EntityId,
        enabled: bool,
    ) -> Result<(bool, BTreeMap<EntityId, PropertyRow>)> {
        let previous = self.layer(layer)?.store_geometry;
        let mut stripped = BTreeMap::new();
        if previous == enabled {
            return Ok((previous, stripped));
        }
        let slots = self.overridden_slots(&[layer]);
        let before = self.resolve_slots(&slots);
        let target = self.layer_mut(layer)?;
        target.store_geometry = enabled;
        if !enabled {
            let entities: Vec<EntityId> = target.overrides.keys().copied().collect();
            for entity in entities {
                let Some(row) = target.overrides.get_mut(&entity) else {
                    continue;
                };
                let mut taken = PropertyRow::new();
                for name in [ITEM_POS, SIZE] {
                    if let Some(value) = row.remove(name) {
                        taken.insert(name.to_string(), value);
                    }
                }
                if row.is_empty() {
                    target.overrides.remove(&entity);
                }
                if !taken.is_empty() {
                    stripped.insert(entity, taken);
                }
            }
        }
        self.changes.push(Change::LayerChanged(layer));
        self.notify_slots(&slots, &before);
        Ok((previous, stripped))
    }

    /// Merges override rows back into a layer.
    ///
    /// Rows for entities that are not live are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn merge_layer_overrides(
        &mut self,
        layer: EntityId,
        rows: &BTreeMap<EntityId, PropertyRow>,
    ) -> Result<()> {
        self.layer(layer)?;
        let slots: Vec<(EntityId, String)> = rows
            .iter()
            .filter(|(entity, _)| self.contains(**entity))
            .flat_map(|(entity, row)| row.keys().map(|name| (*entity, name.clone())))
            .collect();
        let before = self.resolve_slots(&slots);
        let live: Vec<(EntityId, PropertyRow)> = rows
            .iter()
            .filter(|(entity, _)| self.contains(**entity))
            .map(|(entity, row)| (*entity, row.clone()))
            .collect();
        let overlay = &mut self.layer_mut(layer)?.overrides;
        for (entity, row) in live {
            let merged = match overlay.get(&entity) {
                Some(existing) => row.union(existing.clone()),
                None => row,
            };
            overlay.insert(entity, merged);
        }
        self.notify_slots(&slots, &before);
        Ok(())
    }
}
