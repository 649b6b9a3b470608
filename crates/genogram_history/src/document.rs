//! The per-document editing context.
//!
//! A [`Document`] owns one [`Graph`] and its [`UndoStack`]. Every edit goes
//! through a command so it can be undone; the only exceptions are proposals,
//! whose history belongs to whatever proposed them.

use std::collections::BTreeSet;

use genogram_foundation::{
    EntityId, EntityKind, Error, EventKind, RelationshipKind, Result, Value, ValueType,
};
use genogram_storage::schema::TAGS;
use genogram_storage::{
    Change, Emotion, Entity, EntitySnapshot, Event, ExtensionSpec, Graph, Layer, PairBond, Person,
    PropertyRow, Relational,
};
use tracing::{debug, info};

use crate::cascade::{self, Scope};
use crate::command::{Command, CommandId};
use crate::commands::{
    AcceptProposal, AddEntity, AddExtensionProperty, Compound, PropertyEntry,
    RemoveEntities, RemoveExtensionProperty, RenameExtensionProperty, RenameLayer, ReplaceExtensions,
    SetEmotionPeople, SetEventParent, SetLayerActive, SetLayerOrder, SetLayerStoreGeometry,
    SetParents, SetProperty, SetTagRegistry,
};
use crate::config::DocumentConfig;
use crate::stack::UndoStack;

/// One open diagram: its graph, its undo history, and its configuration.
#[derive(Debug)]
pub struct Document {
    graph: Graph,
    stack: UndoStack,
    config: DocumentConfig,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Creates an empty document.
    #[must_use]
    pub fn with_config(config: DocumentConfig) -> Self {
        Self::from_graph(Graph::new(), config)
    }

    /// Wraps a loaded graph. The history starts empty and clean.
    #[must_use]
    pub fn from_graph(graph: Graph, config: DocumentConfig) -> Self {
        Self {
            graph,
            stack: UndoStack::with_limit(config.undo_limit),
            config,
        }
    }

    /// The graph.
    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The undo history.
    #[must_use]
    pub fn stack(&self) -> &UndoStack {
        &self.stack
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// Consumes the document, returning its graph.
    #[must_use]
    pub fn into_graph(self) -> Graph {
        self.graph
    }

    /// Hands out a fresh entity id.
    pub fn allocate_id(&mut self) -> EntityId {
        self.graph.allocate_id()
    }

    /// Takes every queued change notification.
    pub fn drain_changes(&mut self) -> Vec<Change> {
        self.graph.drain_changes()
    }

    /// Marks the current state as saved.
    pub fn mark_saved(&mut self) {
        self.stack.set_clean();
    }

    /// Returns true if the document differs from its saved state.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        !self.stack.is_clean()
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Applies a command and records it for undo.
    ///
    /// # Errors
    ///
    /// Returns the command's error; the document is unchanged.
    pub fn execute(&mut self, command: Box<dyn Command>) -> Result<()> {
        self.stack.push(&mut self.graph, command)
    }

    /// Undoes the last command. Returns false if there was nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the command's error; the document is unchanged.
    pub fn undo(&mut self) -> Result<bool> {
        self.stack.undo(&mut self.graph)
    }

    /// Redoes the next command. Returns false if there was nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns the command's error; the document is unchanged.
    pub fn redo(&mut self) -> Result<bool> {
        self.stack.redo(&mut self.graph)
    }

    /// Returns true if there is something to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.stack.can_undo()
    }

    /// Returns true if there is something to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.stack.can_redo()
    }

    // =========================================================================
    // Structure
    // =========================================================================

    fn add(&mut self, label: &str, snapshot: EntitySnapshot) -> Result<EntityId> {
        let id = snapshot.id();
        self.execute(Box::new(AddEntity::new(label, snapshot)))?;
        Ok(id)
    }

    /// Adds a person, optionally named.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh id; returns the graph's error otherwise.
    pub fn add_person(&mut self, name: Option<&str>) -> Result<EntityId> {
        let id = self.graph.allocate_id();
        let mut snapshot = EntitySnapshot::new(Entity::Person(Person::new(id)));
        if let Some(name) = name {
            snapshot = snapshot.with_properties(PropertyRow::unit("name".to_string(), name.into()));
        }
        self.add("Add person", snapshot)
    }

    /// Adds a pair-bond between two people.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if either endpoint is not a live person or
    /// both are the same.
    pub fn add_pair_bond(&mut self, person_a: EntityId, person_b: EntityId) -> Result<EntityId> {
        let id = self.graph.allocate_id();
        let entity = Entity::PairBond(PairBond::new(id, person_a, person_b));
        self.add("Add pair-bond", EntitySnapshot::new(entity))
    }

    /// Adds an emotional-process link.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the endpoints do not fit the kind.
    pub fn add_emotion(
        &mut self,
        kind: RelationshipKind,
        person_a: EntityId,
        person_b: Option<EntityId>,
    ) -> Result<EntityId> {
        let id = self.graph.allocate_id();
        let entity = Entity::Emotion(Emotion::new(id, kind, person_a, person_b));
        self.add("Add emotion", EntitySnapshot::new(entity))
    }

    /// Adds an event to a person, pair-bond, or emotion.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the owner cannot hold this kind, or
    /// already holds a built-in event of the same kind.
    pub fn add_event(&mut self, kind: EventKind, parent: EntityId) -> Result<EntityId> {
        let id = self.graph.allocate_id();
        let entity = Entity::Event(Event::new(id, kind, parent));
        self.add("Add event", EntitySnapshot::new(entity))
    }

    /// Adds an inactive layer above every existing one.
    ///
    /// # Errors
    ///
    /// Never fails for a fresh id; returns the graph's error otherwise.
    pub fn add_layer(&mut self, name: &str) -> Result<EntityId> {
        let id = self.graph.allocate_id();
        let order = self.graph.next_layer_order();
        let entity = Entity::Layer(Layer::new(id, name, order));
        self.add("Add layer", EntitySnapshot::new(entity))
    }

    /// Sets or clears the parents of a person.
    ///
    /// `target` may be a pair-bond, a multiple birth, or a sibling (a person
    /// or their child link) to become a multiple birth with.
    ///
    /// # Errors
    ///
    /// See [`Graph::plan_set_parents`].
    pub fn set_parents(&mut self, person: EntityId, target: Option<EntityId>) -> Result<()> {
        self.execute(Box::new(SetParents::new(person, target)))
    }

    /// Points an emotion at other people.
    ///
    /// # Errors
    ///
    /// See [`Graph::set_emotion_people`].
    pub fn set_emotion_people(
        &mut self,
        emotion: EntityId,
        person_a: EntityId,
        person_b: Option<EntityId>,
    ) -> Result<()> {
        self.execute(Box::new(SetEmotionPeople::new(emotion, person_a, person_b)))
    }

    /// Moves an event to another owner.
    ///
    /// # Errors
    ///
    /// See [`Graph::set_event_parent`].
    pub fn set_event_parent(&mut self, event: EntityId, parent: EntityId) -> Result<()> {
        self.execute(Box::new(SetEventParent::new(event, parent)))
    }

    /// Removes entities with everything depending on them.
    ///
    /// Returns every removed id, ascending.
    ///
    /// # Errors
    ///
    /// Returns `CascadeFailed` if an id is not live; nothing is removed.
    pub fn remove(&mut self, ids: &[EntityId]) -> Result<Vec<EntityId>> {
        let delta = cascade::map_removal(&self.graph, ids, Scope::All)?;
        let removed = delta.removed();
        self.execute(Box::new(RemoveEntities::mapped(ids.to_vec(), delta)))?;
        Ok(removed)
    }

    // =========================================================================
    // Properties
    // =========================================================================

    /// Resolves a property.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or the property unknown.
    pub fn property(&self, entity: EntityId, name: &str) -> Result<Value> {
        self.graph.property(entity, name)
    }

    /// The slots a user edit of `name` writes to.
    ///
    /// Layered properties go to every eligible active layer; geometry only to
    /// layers that store it. With no eligible layer the base value is used.
    fn edit_entries(
        &self,
        entity: EntityId,
        name: &str,
        value: Option<Value>,
    ) -> Result<Vec<PropertyEntry>> {
        let kind = self.graph.get(entity)?.kind();
        let info = self.graph.property_info(kind, name)?;
        if info.layered {
            let layers: Vec<EntityId> = self
                .graph
                .active_layers()
                .into_iter()
                .filter(|layer| !info.geometry || layer.stores_geometry())
                .map(Layer::id)
                .collect();
            if !layers.is_empty() {
                return Ok(layers
                    .into_iter()
                    .map(|layer| PropertyEntry::layered(layer, entity, name, value.clone()))
                    .collect());
            }
        }
        Ok(vec![PropertyEntry::base(entity, name, value)])
    }

    /// Sets a property the way a user edit does.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing, the property unknown, or
    /// the value of the wrong type.
    pub fn set_property(&mut self, entity: EntityId, name: &str, value: Value) -> Result<()> {
        let entries = self.edit_entries(entity, name, Some(value))?;
        self.execute(Box::new(SetProperty::new(format!("Set {name}"), entries)))
    }

    /// Resets a property the way a user edit does.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is missing or the property unknown.
    pub fn reset_property(&mut self, entity: EntityId, name: &str) -> Result<()> {
        let entries = self.edit_entries(entity, name, None)?;
        self.execute(Box::new(SetProperty::new(format!("Reset {name}"), entries)))
    }

    /// Sets the base value, ignoring layers.
    ///
    /// # Errors
    ///
    /// See [`Graph::set_base`].
    pub fn set_base(&mut self, entity: EntityId, name: &str, value: Value) -> Result<()> {
        let entry = PropertyEntry::base(entity, name, Some(value));
        self.execute(Box::new(SetProperty::new(format!("Set {name}"), vec![entry])))
    }

    /// Sets an override on one layer.
    ///
    /// # Errors
    ///
    /// See [`Graph::set_override`].
    pub fn set_override(
        &mut self,
        layer: EntityId,
        entity: EntityId,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let entry = PropertyEntry::layered(layer, entity, name, Some(value));
        self.execute(Box::new(SetProperty::new(format!("Set {name}"), vec![entry])))
    }

    /// Clears an override on one layer.
    ///
    /// # Errors
    ///
    /// See [`Graph::reset_override`].
    pub fn reset_override(&mut self, layer: EntityId, entity: EntityId, name: &str) -> Result<()> {
        let entry = PropertyEntry::layered(layer, entity, name, None);
        self.execute(Box::new(SetProperty::new(format!("Reset {name}"), vec![entry])))
    }

    /// Starts a continuous edit. Pass the id to every [`drag_property`]
    /// call of the drag so they undo as one step.
    ///
    /// [`drag_property`]: Self::drag_property
    pub fn begin_drag(&mut self) -> CommandId {
        self.stack.next_id()
    }

    /// Sets a property as part of a continuous edit.
    ///
    /// # Errors
    ///
    /// See [`set_property`](Self::set_property).
    pub fn drag_property(
        &mut self,
        drag: CommandId,
        entity: EntityId,
        name: &str,
        value: Value,
    ) -> Result<()> {
        let entries = self.edit_entries(entity, name, Some(value))?;
        let command = SetProperty::new(format!("Set {name}"), entries).with_id(drag);
        self.execute(Box::new(command))
    }

    /// Clears every override a layer holds, as one step.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn reset_layer_overrides(&mut self, layer: EntityId) -> Result<()> {
        let entries: Vec<PropertyEntry> = self
            .graph
            .layer(layer)?
            .overrides()
            .iter()
            .flat_map(|(entity, row)| {
                row.keys()
                    .map(move |name| PropertyEntry::layered(layer, *entity, name.clone(), None))
            })
            .collect();
        if entries.is_empty() {
            return Ok(());
        }
        self.execute(Box::new(SetProperty::new("Reset layer", entries)))
    }

    // =========================================================================
    // Layers
    // =========================================================================

    /// Activates or deactivates a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn set_layer_active(&mut self, layer: EntityId, active: bool) -> Result<()> {
        self.execute(Box::new(SetLayerActive::new(layer, active)))
    }

    /// Gives `order[i]` order index `i`.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` unless `order` lists every layer once.
    pub fn reorder_layers(&mut self, order: Vec<EntityId>) -> Result<()> {
        self.execute(Box::new(SetLayerOrder::new(order)))
    }

    /// Renames a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn rename_layer(&mut self, layer: EntityId, name: &str) -> Result<()> {
        self.execute(Box::new(RenameLayer::new(layer, name)))
    }

    /// Turns geometry storage on or off for a layer.
    ///
    /// # Errors
    ///
    /// Returns an error if `layer` is not a live layer.
    pub fn set_layer_store_geometry(&mut self, layer: EntityId, enabled: bool) -> Result<()> {
        self.execute(Box::new(SetLayerStoreGeometry::new(layer, enabled)))
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Registers a tag. Returns false if it already existed.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` for a blank tag.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool> {
        if tag.trim().is_empty() {
            return Err(Error::invariant("tags cannot be blank"));
        }
        if self.graph.tags().contains(tag) {
            return Ok(false);
        }
        let mut tags = self.graph.tags().clone();
        tags.insert(tag.to_string());
        self.execute(Box::new(SetTagRegistry::new("Add tag", tags)))?;
        Ok(true)
    }

    /// Unregisters a tag and strips it from every entity, as one step.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the tag is not registered.
    pub fn remove_tag(&mut self, tag: &str) -> Result<()> {
        let mut tags = self.graph.tags().clone();
        if !tags.remove(tag) {
            return Err(Error::invariant(format!("unknown tag {tag:?}")));
        }
        let mut compound =
            Compound::new("Remove tag").with(Box::new(SetTagRegistry::new("Remove tag", tags)));
        let entries = self.retag(tag, None);
        if !entries.is_empty() {
            compound.push(Box::new(SetProperty::new("Remove tag", entries)));
        }
        self.execute(Box::new(compound))
    }

    /// Renames a tag in the registry and on every entity, as one step.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `old` is not registered or `new` is
    /// blank or already registered.
    pub fn rename_tag(&mut self, old: &str, new: &str) -> Result<()> {
        if new.trim().is_empty() {
            return Err(Error::invariant("tags cannot be blank"));
        }
        let mut tags = self.graph.tags().clone();
        if !tags.remove(old) {
            return Err(Error::invariant(format!("unknown tag {old:?}")));
        }
        if !tags.insert(new.to_string()) {
            return Err(Error::invariant(format!("tag {new:?} already exists")));
        }
        let mut compound =
            Compound::new("Rename tag").with(Box::new(SetTagRegistry::new("Rename tag", tags)));
        let entries = self.retag(old, Some(new));
        if !entries.is_empty() {
            compound.push(Box::new(SetProperty::new("Rename tag", entries)));
        }
        self.execute(Box::new(compound))
    }

    /// Tag-list edits replacing `old` with `new` (or dropping it) everywhere.
    fn retag(&self, old: &str, new: Option<&str>) -> Vec<PropertyEntry> {
        self.graph
            .find_by_tag(old)
            .into_iter()
            .map(|id| {
                let mut tags: Vec<String> = Vec::new();
                for tag in self.graph.entity_tags(id) {
                    let tag = if tag == old {
                        match new {
                            Some(new) => new.to_string(),
                            None => continue,
                        }
                    } else {
                        tag
                    };
                    if !tags.contains(&tag) {
                        tags.push(tag);
                    }
                }
                PropertyEntry::base(id, TAGS, tag_list(tags))
            })
            .collect()
    }

    /// Attaches a registered tag to an entity.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the tag is not registered, or an error
    /// if the entity cannot carry tags.
    pub fn tag_entity(&mut self, entity: EntityId, tag: &str) -> Result<()> {
        if !self.graph.tags().contains(tag) {
            return Err(Error::invariant(format!("unknown tag {tag:?}")));
        }
        let mut tags = self.graph.entity_tags(entity);
        if tags.iter().any(|t| t == tag) {
            return Ok(());
        }
        tags.push(tag.to_string());
        let entry = PropertyEntry::base(entity, TAGS, tag_list(tags));
        self.execute(Box::new(SetProperty::new("Tag item", vec![entry])))
    }

    /// Detaches a tag from an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity cannot carry tags.
    pub fn untag_entity(&mut self, entity: EntityId, tag: &str) -> Result<()> {
        let mut tags = self.graph.entity_tags(entity);
        let count = tags.len();
        tags.retain(|t| t != tag);
        if tags.len() == count {
            return Ok(());
        }
        let entry = PropertyEntry::base(entity, TAGS, tag_list(tags));
        self.execute(Box::new(SetProperty::new("Untag item", vec![entry])))
    }

    // =========================================================================
    // Event properties
    // =========================================================================

    /// Registers an event property, returning its attribute key.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if the key is taken.
    pub fn add_extension(&mut self, name: &str, ty: ValueType) -> Result<String> {
        let spec = ExtensionSpec::new(name, ty);
        let attr = spec.attr.clone();
        self.execute(Box::new(AddExtensionProperty::new(None, spec)))?;
        Ok(attr)
    }

    /// Unregisters an event property; undo restores every event's value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProperty` if no extension has this key.
    pub fn remove_extension(&mut self, attr: &str) -> Result<()> {
        self.execute(Box::new(RemoveExtensionProperty::new(attr)))
    }

    /// Renames an event property, returning its new attribute key.
    ///
    /// # Errors
    ///
    /// Returns an error if `attr` is unknown or the new key is taken.
    pub fn rename_extension(&mut self, attr: &str, name: &str) -> Result<String> {
        self.execute(Box::new(RenameExtensionProperty::new(attr, name)))?;
        Ok(genogram_storage::schema::attr_for(name))
    }

    /// Swaps the whole event property registry for `specs`.
    ///
    /// Every event loses its old extension values; undo brings them back.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if two specs share a key.
    pub fn replace_extensions(&mut self, specs: Vec<ExtensionSpec>) -> Result<()> {
        self.execute(Box::new(ReplaceExtensions::new(specs)))
    }

    // =========================================================================
    // Proposals
    // =========================================================================

    /// Inserts a proposed entity. Not recorded for undo.
    ///
    /// # Errors
    ///
    /// See [`Graph::insert_proposed`].
    pub fn propose(&mut self, entity: Entity) -> Result<EntityId> {
        let id = entity.id();
        self.graph.insert_proposed(entity)?;
        debug!(%id, "proposed entity");
        Ok(id)
    }

    /// Commits a proposed entity and every proposed entity it references,
    /// as one undoable step. Returns the committed ids.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `id` is not proposed.
    pub fn accept_proposed(&mut self, id: EntityId) -> Result<BTreeSet<EntityId>> {
        let closure = self.graph.proposal_closure(id)?;
        if closure.is_empty() {
            return Err(Error::invariant(format!("{id} is not proposed")));
        }
        self.execute(Box::new(AcceptProposal::new(closure.clone())))?;
        info!(%id, committed = closure.len(), "accepted proposal");
        Ok(closure)
    }

    /// Removes a proposed entity and every proposed entity depending on it.
    /// Not recorded for undo. Returns the removed ids.
    ///
    /// Commands that edited the removed entities can no longer replay, so
    /// they are dropped from the history.
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolation` if `id` is not proposed; nothing is
    /// removed.
    pub fn reject_proposed(&mut self, id: EntityId) -> Result<Vec<EntityId>> {
        let delta = cascade::map_removal(&self.graph, &[id], Scope::Proposed)?;
        self.graph.atomically(|g| g.apply_delta(&delta))?;
        let removed = delta.removed();
        let dropped = self.stack.retain_replayable(&self.graph);
        info!(%id, removed = removed.len(), dropped, "rejected proposal");
        Ok(removed)
    }

    /// Checks every graph invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.graph.validate()
    }

    /// Ids of every live entity of `kind`, ascending.
    #[must_use]
    pub fn ids_of(&self, kind: EntityKind) -> Vec<EntityId> {
        self.graph
            .iter_kind(kind)
            .map(Relational::id)
            .collect()
    }
}

fn tag_list(tags: Vec<String>) -> Option<Value> {
    if tags.is_empty() {
        None
    } else {
        Some(Value::List(tags.into_iter().map(Value::String).collect()))
    }
}
