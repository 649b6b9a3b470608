//! Per-diagram event properties.

use std::collections::BTreeMap;

use genogram_foundation::{EntityId, EntityKind, Error, Result, Value};

use crate::entity::Relational;
use crate::graph::Graph;
use crate::notify::Change;
use crate::schema::{ExtensionRegistry, ExtensionSpec};

/// An extension property taken out of the registry, with every event value
/// it held.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedExtension {
    /// Former registry position.
    pub index: usize,
    /// The removed spec.
    pub spec: ExtensionSpec,
    /// Base values per event.
    pub values: BTreeMap<EntityId, Value>,
}

/// A whole extension registry swapped out by [`Graph::replace_extensions`],
/// with every event value its extensions held.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplacedExtensions {
    /// The registry as it was.
    pub registry: ExtensionRegistry,
    /// Base values per attribute key, then per event.
    pub values: BTreeMap<String, BTreeMap<EntityId, Value>>,
}

impl Graph {
    /// The extension registry.
    #[must_use]
    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Registers an event property at `index`, or at the end.
    ///
    /// Returns the position it was inserted at.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the attribute key is empty or taken.
    pub fn add_extension(&mut self, index: Option<usize>, spec: ExtensionSpec) -> Result<usize> {
        let index = index.unwrap_or(self.extensions.len()).min(self.extensions.len());
        self.extensions.insert(index, spec)?;
        self.changes.push(Change::Extensions);
        Ok(index)
    }

    /// Unregisters an event property and strips its values from every event.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProperty` if no extension has this key.
    pub fn remove_extension(&mut self, attr: &str) -> Result<RemovedExtension> {
        if self.extensions.get(attr).is_none() {
            return Err(Error::unknown_property(EntityKind::Event, attr));
        }
        let values = self.take_event_values(attr);
        let (index, spec) = self
            .extensions
            .remove(attr)
            .ok_or_else(|| Error::unknown_property(EntityKind::Event, attr))?;
        self.changes.push(Change::Extensions);
        Ok(RemovedExtension {
            index,
            spec,
            values,
        })
    }

    /// Puts a removed extension back at its former position, with its values.
    ///
    /// # Errors
    ///
    /// Returns an error if the key was taken in the meantime. Values for
    /// events that are no longer live are skipped.
    pub fn restore_extension(&mut self, removed: &RemovedExtension) -> Result<()> {
        self.atomically(|g| {
            g.add_extension(Some(removed.index), removed.spec.clone())?;
            g.put_event_values(&removed.spec.attr, &removed.values)
        })
    }

    /// Renames an extension, moving its values to the new key.
    ///
    /// Returns the previous display name.
    ///
    /// # Errors
    ///
    /// Returns an error if `attr` is unknown or the new key is taken.
    pub fn rename_extension(&mut self, attr: &str, name: &str) -> Result<String> {
        self.atomically(|g| {
            let Some(index) = g.extensions.position(attr) else {
                return Err(Error::unknown_property(EntityKind::Event, attr));
            };
            let removed = g.remove_extension(attr)?;
            let renamed = ExtensionSpec::new(name, removed.spec.ty);
            let new_attr = renamed.attr.clone();
            g.add_extension(Some(index), renamed)?;
            g.put_event_values(&new_attr, &removed.values)?;
            Ok(removed.spec.name)
        })
    }

    /// Swaps the whole registry for `specs` with a single notification.
    ///
    /// Every value of the old extensions is stripped from the events; the
    /// new extensions start empty, even where a key is reused.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if two new specs share a key or one
    /// collides with a built-in event property. The graph is unchanged.
    pub fn replace_extensions(&mut self, specs: Vec<ExtensionSpec>) -> Result<ReplacedExtensions> {
        let mut registry = ExtensionRegistry::new();
        for spec in specs {
            registry.push(spec)?;
        }
        let attrs: Vec<String> = self.extensions.iter().map(|s| s.attr.clone()).collect();
        let mut values = BTreeMap::new();
        for attr in attrs {
            let taken = self.take_event_values(&attr);
            if !taken.is_empty() {
                values.insert(attr, taken);
            }
        }
        let registry = std::mem::replace(&mut self.extensions, registry);
        self.changes.push(Change::Extensions);
        Ok(ReplacedExtensions { registry, values })
    }

    /// Puts back a registry taken out by
    /// [`replace_extensions`](Self::replace_extensions), with its values.
    ///
    /// # Errors
    ///
    /// Returns an error if a value no longer fits its property. Values for
    /// events that are no longer live are skipped.
    pub fn restore_extensions(&mut self, replaced: &ReplacedExtensions) -> Result<()> {
        self.atomically(|g| {
            g.replace_extensions(replaced.registry.iter().cloned().collect())?;
            for (attr, values) in &replaced.values {
                g.put_event_values(attr, values)?;
            }
            Ok(())
        })
    }

    fn take_event_values(&mut self, attr: &str) -> BTreeMap<EntityId, Value> {
        let events: Vec<EntityId> = self
            .iter_kind(EntityKind::Event)
            .map(Relational::id)
            .collect();
        let mut values = BTreeMap::new();
        for event in events {
            let mut emptied = false;
            let taken = self.properties.get_mut(&event).and_then(|row| {
                let taken = row.remove(attr);
                emptied = row.is_empty();
                taken
            });
            if emptied {
                self.properties.remove(&event);
            }
            if let Some(value) = taken {
                if !value.is_nil() {
                    self.changes.push(Change::Property {
                        entity: event,
                        name: attr.to_string(),
                    });
                }
                values.insert(event, value);
            }
        }
        values
    }

    fn put_event_values(&mut self, attr: &str, values: &BTreeMap<EntityId, Value>) -> Result<()> {
        for (event, value) in values {
            if self.contains(*event) {
                self.set_base(*event, attr, value.clone())?;
            }
        }
        Ok(())
    }
}
