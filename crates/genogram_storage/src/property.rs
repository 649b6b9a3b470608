//! Property storage and layered resolution.
//!
//! Base values live in a table keyed by entity. Overrides live in each
//! [`Layer`](crate::Layer)'s overlay. Reading a property walks the active
//! layers from the highest order index down; the first override found wins,
//! then the base value, then the schema default.

use genogram_foundation::{EntityId, EntityKind, Error, Result, Value};
use im::OrdMap;

use crate::entity::Relational;
use crate::graph::Graph;
use crate::notify::Change;
use crate::schema::{self, PropertyInfo};

/// Property values of one entity, keyed by name.
pub type PropertyRow = OrdMap<String, Value>;

/// Base property rows of every entity. Rows are never stored empty.
pub type PropertyTable = OrdMap<EntityId, PropertyRow>;

impl Graph {
    /// Returns the declaration of a property on a kind.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProperty` if the kind declares no such property.
    pub fn property_info(&self, kind: EntityKind, name: &str) -> Result<PropertyInfo> {
        if let Some(spec) = schema::find(kind, name) {
            return Ok(spec.into());
        }
        if kind == EntityKind::Event {
            if let Some(ext) = self.extensions.get(name) {
                return Ok(PropertyInfo {
                    ty: ext.ty,
                    layered: false,
                    geometry: false,
                    default: Value::Nil,
                });
            }
        }
        Err(Error::unknown_property(kind, name))
    }

    fn check_value(&self, kind: EntityKind, name: &str, value: &Value) -> Result<PropertyInfo> {
        let info = self.property_info(kind, name)?;
        if !info.ty.accepts(value) {
            return Err(Error::type_mismatch(name, info.ty, value.value_type()));
        }
        Ok(info)
    }

    pub(crate) fn check_row(&self, kind: EntityKind, row: &PropertyRow) -> Result<()> {
        for (name, value) in row {
            self.check_value(kind, name, value)?;
        }
        Ok(())
    }

    /// Resolves the current value of a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or the property unknown.
    pub fn property(&self, entity: EntityId, name: &str) -> Result<Value> {
        let kind = self.get(entity)?.kind();
        let info = self.property_info(kind, name)?;
        if info.layered {
            if let Some((_, value)) = self.winning_override(entity, name, info.geometry) {
                return Ok(value.clone());
            }
        }
        Ok(self.base_value(entity, name).cloned().unwrap_or(info.default))
    }

    /// Returns the active layer whose override currently wins, with its value.
    ///
    /// Geometry properties skip layers that do not store geometry.
    #[must_use]
    pub fn winning_override(
        &self,
        entity: EntityId,
        name: &str,
        geometry: bool,
    ) -> Option<(EntityId, &Value)> {
        self.active_layers()
            .into_iter()
            .rev()
            .filter(|layer| !geometry || layer.store_geometry)
            .find_map(|layer| layer.get_override(entity, name).map(|v| (layer.id, v)))
    }

    /// Returns the stored base value, ignoring layers and defaults.
    #[must_use]
    pub fn base_value(&self, entity: EntityId, name: &str) -> Option<&Value> {
        self.properties.get(&entity).and_then(|row| row.get(name))
    }

    /// Returns the whole base row of an entity.
    #[must_use]
    pub fn base_row(&self, entity: EntityId) -> Option<&PropertyRow> {
        self.properties.get(&entity)
    }

    /// Returns a layer's override for one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn override_value(&self, layer: EntityId, entity: EntityId, name: &str) -> Result<Option<&Value>> {
        Ok(self.layer(layer)?.get_override(entity, name))
    }

    /// Sets a base value, returning the previous base value.
    ///
    /// The value is recorded even while an active layer shadows it.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing, the property unknown, or
    /// the value of the wrong type.
    pub fn set_base(&mut self, entity: EntityId, name: &str, value: Value) -> Result<Option<Value>> {
        let kind = self.get(entity)?.kind();
        self.check_value(kind, name, &value)?;
        let before = self.property(entity, name)?;
        let previous = match self.properties.get_mut(&entity) {
            Some(row) => row.insert(name.to_string(), value),
            None => {
                self.properties
                    .insert(entity, OrdMap::unit(name.to_string(), value));
                None
            }
        };
        self.notify_if_changed(entity, name, &before);
        Ok(previous)
    }

    /// Clears a base value, returning what was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or the property unknown.
    pub fn reset_base(&mut self, entity: EntityId, name: &str) -> Result<Option<Value>> {
        let kind = self.get(entity)?.kind();
        self.property_info(kind, name)?;
        let before = self.property(entity, name)?;
        let mut emptied = false;
        let previous = self.properties.get_mut(&entity).and_then(|row| {
            let previous = row.remove(name);
            emptied = row.is_empty();
            previous
        });
        if emptied {
            self.properties.remove(&entity);
        }
        self.notify_if_changed(entity, name, &before);
        Ok(previous)
    }

    /// Sets an override on one layer, returning the previous override.
    ///
    /// Never touches the base value.
    ///
    /// # Errors
    ///
    /// Returns `NotLayered` for properties without layer support, and
    /// `InvariantViolation` for geometry on a layer that does not store it.
    pub fn set_override(
        &mut self,
        layer: EntityId,
        entity: EntityId,
        name: &str,
        value: Value,
    ) -> Result<Option<Value>> {
        let store_geometry = self.layer(layer)?.store_geometry;
        let kind = self.get(entity)?.kind();
        let info = self.check_value(kind, name, &value)?;
        if !info.layered {
            return Err(Error::not_layered(name));
        }
        if info.geometry && !store_geometry {
            return Err(Error::invariant(format!(
                "layer {layer} does not store geometry ({name})"
            )));
        }
        let before = self.property(entity, name)?;
        let overlay = &mut self.layer_mut(layer)?.overrides;
        let previous = match overlay.get_mut(&entity) {
            Some(row) => row.insert(name.to_string(), value),
            None => {
                overlay.insert(entity, OrdMap::unit(name.to_string(), value));
                None
            }
        };
        self.notify_if_changed(entity, name, &before);
        Ok(previous)
    }

    /// Clears an override on one layer, returning what was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a layer or the entity is missing.
    pub fn reset_override(&mut self, layer: EntityId, entity: EntityId, name: &str) -> Result<Option<Value>> {
        self.layer(layer)?;
        let kind = self.get(entity)?.kind();
        self.property_info(kind, name)?;
        let before = self.property(entity, name)?;
        let overlay = &mut self.layer_mut(layer)?.overrides;
        let mut emptied = false;
        let previous = overlay.get_mut(&entity).and_then(|row| {
            let previous = row.remove(name);
            emptied = row.is_empty();
            previous
        });
        if emptied {
            overlay.remove(&entity);
        }
        self.notify_if_changed(entity, name, &before);
        Ok(previous)
    }

    pub(crate) fn notify_if_changed(&mut self, entity: EntityId, name: &str, before: &Value) {
        if let Ok(after) = self.property(entity, name) {
            if after != *before {
                self.changes.push(Change::Property {
                    entity,
                    name: name.to_string(),
                });
            }
        }
    }
}
