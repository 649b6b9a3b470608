//! The entity arena.
//!
//! The `Graph` is the only owner of entities. It uses persistent maps, so a
//! clone is O(1) and shares structure with the original; failed multi-step
//! mutations roll back by restoring a clone taken before the first step.

use std::collections::{BTreeMap, BTreeSet};

use genogram_foundation::{EntityId, EntityKind, Error, EventKind, IdAllocator, Result};
use im::{OrdMap, OrdSet};

use crate::entity::{
    ChildOf, Emotion, Entity, Event, Layer, MultipleBirth, PairBond, Person, Relational,
};
use crate::notify::Change;
use crate::property::{PropertyRow, PropertyTable};
use crate::schema::ExtensionRegistry;

/// Everything needed to resurrect one entity with identical id, links,
/// properties, and layer overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// The entity. Back-reference sets are rebuilt on attach.
    pub entity: Entity,
    /// Base property values.
    pub properties: PropertyRow,
    /// Override rows for this entity, keyed by layer id.
    pub overrides: BTreeMap<EntityId, PropertyRow>,
    /// Whether the entity was proposed.
    pub proposed: bool,
}

impl EntitySnapshot {
    /// Creates a snapshot of a fresh committed entity with no properties.
    #[must_use]
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            properties: PropertyRow::new(),
            overrides: BTreeMap::new(),
            proposed: false,
        }
    }

    /// Sets the base properties.
    #[must_use]
    pub fn with_properties(mut self, properties: PropertyRow) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the proposed flag.
    #[must_use]
    pub fn with_proposed(mut self, proposed: bool) -> Self {
        self.proposed = proposed;
        self
    }

    /// The entity id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }

    /// The entity kind.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.entity.kind()
    }
}

/// The canonical set of live entities and their properties.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub(crate) entities: OrdMap<EntityId, Entity>,
    pub(crate) properties: PropertyTable,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) extensions: ExtensionRegistry,
    pub(crate) proposed: OrdSet<EntityId>,
    pub(crate) layer_ids: OrdSet<EntityId>,
    ids: IdAllocator,
    pub(crate) changes: Vec<Change>,
}

/// Structural equality: entities, properties, overlays, registries, and the
/// proposed set. The id allocator and the change queue are not compared.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
            && self.properties == other.properties
            && self.tags == other.tags
            && self.extensions == other.extensions
            && self.proposed == other.proposed
    }
}

macro_rules! typed_getter {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $label:literal) => {
        $(#[$doc])*
        ///
        /// # Errors
        ///
        /// Returns an error if the entity is missing or of another kind.
        pub fn $name(&self, id: EntityId) -> Result<&$ty> {
            match self.get(id)? {
                Entity::$variant(inner) => Ok(inner),
                other => Err(Error::wrong_kind(id, $label, other.kind())),
            }
        }
    };
}

impl Graph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Ids and lookup
    // =========================================================================

    /// Hands out a fresh, never-used id.
    pub fn allocate_id(&mut self) -> EntityId {
        self.ids.allocate()
    }

    /// Returns the id the allocator will hand out next.
    #[must_use]
    pub fn peek_id(&self) -> EntityId {
        self.ids.peek()
    }

    /// Looks up a live entity.
    #[must_use]
    pub fn resolve(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Looks up a live entity, failing if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for unknown or removed ids.
    pub fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entities.get(&id).ok_or_else(|| Error::entity_not_found(id))
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.entities
            .get_mut(&id)
            .ok_or_else(|| Error::entity_not_found(id))
    }

    /// Returns true if the entity is live.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns the kind of a live entity.
    #[must_use]
    pub fn kind_of(&self, id: EntityId) -> Option<EntityKind> {
        self.resolve(id).map(Relational::kind)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if nothing is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates live entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Iterates live entities of one kind in id order.
    pub fn iter_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.kind() == kind)
    }

    typed_getter!(
        /// Looks up a person.
        person, Person, Person, "person"
    );
    typed_getter!(
        /// Looks up a pair-bond.
        pair_bond, PairBond, PairBond, "pair_bond"
    );
    typed_getter!(
        /// Looks up a child link.
        child_of, ChildOf, ChildOf, "child_of"
    );
    typed_getter!(
        /// Looks up a multiple birth.
        multiple_birth, MultipleBirth, MultipleBirth, "multiple_birth"
    );
    typed_getter!(
        /// Looks up an emotion.
        emotion, Emotion, Emotion, "emotion"
    );
    typed_getter!(
        /// Looks up an event.
        event, Event, Event, "event"
    );
    typed_getter!(
        /// Looks up a layer.
        layer, Layer, Layer, "layer"
    );

    pub(crate) fn layer_mut(&mut self, id: EntityId) -> Result<&mut Layer> {
        match self.get_mut(id)? {
            Entity::Layer(layer) => Ok(layer),
            other => Err(Error::wrong_kind(id, "layer", other.kind())),
        }
    }

    // =========================================================================
    // Insert / remove
    // =========================================================================

    /// Registers a committed entity and wires its back-references.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is live, or `InvariantViolation` if a
    /// reference is missing, of the wrong kind, or the entity's shape is
    /// invalid. Nothing is changed on error.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        self.insert_as(entity, false)
    }

    /// Registers a proposed entity. Proposed entities may reference both
    /// committed and proposed entities.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn insert_proposed(&mut self, entity: Entity) -> Result<()> {
        self.insert_as(entity, true)
    }

    fn insert_as(&mut self, mut entity: Entity, proposed: bool) -> Result<()> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(Error::duplicate_id(id));
        }
        self.check_references(&entity, proposed)?;
        self.check_shape(&entity)?;

        entity.clear_dependents();
        let kind = entity.kind();
        if let Entity::Layer(layer) = &mut entity {
            let stale: Vec<EntityId> = layer
                .overrides
                .keys()
                .filter(|e| !self.entities.contains_key(*e))
                .copied()
                .collect();
            for e in stale {
                layer.overrides.remove(&e);
            }
            self.layer_ids.insert(id);
        }
        for reference in entity.references() {
            if let Some(target) = self.entities.get_mut(&reference.target) {
                target.attach_dependent(kind, id);
            }
        }
        self.entities.insert(id, entity);
        self.ids.observe(id);
        if proposed {
            self.proposed.insert(id);
        }
        self.changes.push(Change::Added(id));
        Ok(())
    }

    pub(crate) fn check_references(&self, entity: &Entity, proposed: bool) -> Result<()> {
        let kind = entity.kind();
        for reference in entity.references() {
            let Some(target) = self.resolve(reference.target) else {
                return Err(Error::invariant(format!(
                    "{kind} {}: {} does not exist",
                    reference.field, reference.target
                )));
            };
            if !reference.accepts.contains(&target.kind()) {
                return Err(Error::invariant(format!(
                    "{kind} {}: {} is a {}",
                    reference.field,
                    reference.target,
                    target.kind()
                )));
            }
            if !proposed && self.proposed.contains(&reference.target) {
                return Err(Error::invariant(format!(
                    "committed {kind} cannot reference proposed {}",
                    reference.target
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn check_shape(&self, entity: &Entity) -> Result<()> {
        match entity {
            Entity::PairBond(pb) => {
                if pb.person_a == pb.person_b {
                    return Err(Error::invariant(format!(
                        "pair-bond endpoints must differ: {}",
                        pb.person_a
                    )));
                }
            }
            Entity::ChildOf(child_of) => {
                let person = self.person(child_of.person)?;
                if let Some(existing) = person.child_of {
                    if existing != child_of.id {
                        return Err(Error::invariant(format!(
                            "{} already has parents via {existing}",
                            child_of.person
                        )));
                    }
                }
                let pair_bond = self.pair_bond(self.parent_pair_bond(child_of.target)?)?;
                if pair_bond.has_endpoint(child_of.person) {
                    return Err(Error::invariant(format!(
                        "{} cannot be a child of their own pair-bond {}",
                        child_of.person, pair_bond.id
                    )));
                }
            }
            Entity::Emotion(emotion) => match (emotion.relationship.is_monadic(), emotion.person_b) {
                (true, Some(_)) => {
                    return Err(Error::invariant(format!(
                        "{} emotions have a single endpoint",
                        emotion.relationship
                    )));
                }
                (false, None) => {
                    return Err(Error::invariant(format!(
                        "{} emotions need two endpoints",
                        emotion.relationship
                    )));
                }
                (false, Some(b)) if b == emotion.person_a => {
                    return Err(Error::invariant(format!(
                        "{} emotion endpoints must differ",
                        emotion.relationship
                    )));
                }
                _ => {}
            },
            Entity::Event(event) => self.check_event_unique(event.id, event.kind, event.parent)?,
            Entity::Layer(layer) => {
                if let Some(other) = self
                    .layers()
                    .into_iter()
                    .find(|l| l.order == layer.order && l.id != layer.id)
                {
                    return Err(Error::invariant(format!(
                        "layer order {} is taken by {}",
                        layer.order, other.id
                    )));
                }
            }
            Entity::Person(_) | Entity::MultipleBirth(_) => {}
        }
        Ok(())
    }

    pub(crate) fn check_event_unique(
        &self,
        event: EntityId,
        kind: EventKind,
        parent: EntityId,
    ) -> Result<()> {
        if !kind.is_built_in() {
            return Ok(());
        }
        let clash = self
            .events_of(parent)
            .into_iter()
            .filter(|other| *other != event)
            .find(|other| self.event(*other).is_ok_and(|e| e.kind == kind));
        match clash {
            Some(other) => Err(Error::invariant(format!(
                "{parent} already has a {kind} event: {other}"
            ))),
            None => Ok(()),
        }
    }

    /// Unlinks and removes an entity that nothing references any more.
    ///
    /// The entity's property row and its override rows in every layer go
    /// with it into the returned snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the id is not live, or
    /// `InvariantViolation` if dependents remain. Cascading is the caller's
    /// job.
    pub fn remove(&mut self, id: EntityId) -> Result<EntitySnapshot> {
        let dependents = self.get(id)?.dependents();
        if !dependents.is_empty() {
            return Err(Error::invariant(format!(
                "{id} still has dependents: {dependents:?}"
            )));
        }
        let entity = self
            .entities
            .remove(&id)
            .ok_or_else(|| Error::entity_not_found(id))?;
        for reference in entity.references() {
            if let Some(target) = self.entities.get_mut(&reference.target) {
                target.detach_dependent(id);
            }
        }
        if entity.kind() == EntityKind::Layer {
            self.layer_ids.remove(&id);
        }
        let properties = self.properties.remove(&id).unwrap_or_default();
        let overrides = self.take_overrides(id);
        let proposed = self.proposed.remove(&id).is_some();
        self.changes.push(Change::Removed(id));
        Ok(EntitySnapshot {
            entity,
            properties,
            overrides,
            proposed,
        })
    }

    fn take_overrides(&mut self, entity: EntityId) -> BTreeMap<EntityId, PropertyRow> {
        let mut taken = BTreeMap::new();
        let layer_ids: Vec<EntityId> = self.layer_ids.iter().copied().collect();
        for layer_id in layer_ids {
            if let Ok(layer) = self.layer_mut(layer_id) {
                if let Some(row) = layer.overrides.remove(&entity) {
                    taken.insert(layer_id, row);
                }
            }
        }
        taken
    }

    /// Captures an entity without changing anything.
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` if the id is not live.
    pub fn snapshot(&self, id: EntityId) -> Result<EntitySnapshot> {
        let entity = self.get(id)?.clone();
        let overrides = self
            .layer_ids
            .iter()
            .filter_map(|layer_id| {
                let row = self.layer(*layer_id).ok()?.overrides.get(&id)?;
                Some((*layer_id, row.clone()))
            })
            .collect();
        Ok(EntitySnapshot {
            entity,
            properties: self.properties.get(&id).cloned().unwrap_or_default(),
            overrides,
            proposed: self.proposed.contains(&id),
        })
    }

    /// Re-inserts a snapshotted entity with its properties and overrides.
    ///
    /// Override rows for layers that are not live are skipped; a later call
    /// to [`restore_overrides`](Self::restore_overrides) can fill them in.
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert); also fails if a stored property does not
    /// match the schema.
    pub fn attach(&mut self, snapshot: EntitySnapshot) -> Result<()> {
        let id = snapshot.id();
        self.check_row(snapshot.kind(), &snapshot.properties)?;
        self.insert_as(snapshot.entity, snapshot.proposed)?;
        if !snapshot.properties.is_empty() {
            self.properties.insert(id, snapshot.properties);
        }
        self.restore_overrides(id, &snapshot.overrides);
        Ok(())
    }

    /// Writes override rows for `entity` into every live layer named.
    pub fn restore_overrides(&mut self, entity: EntityId, rows: &BTreeMap<EntityId, PropertyRow>) {
        if !self.contains(entity) {
            return;
        }
        for (layer_id, row) in rows {
            if row.is_empty() {
                continue;
            }
            if let Ok(layer) = self.layer_mut(*layer_id) {
                layer.overrides.insert(entity, row.clone());
            }
        }
    }

    /// Runs `f`, restoring the previous state if it fails.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn atomically<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                *self = saved;
                Err(err)
            }
        }
    }

    /// Takes every queued change notification.
    pub fn drain_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Resolves a child-link target to its pair-bond.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is neither a pair-bond nor a multiple birth.
    pub fn parent_pair_bond(&self, target: EntityId) -> Result<EntityId> {
        match self.get(target)? {
            Entity::PairBond(pb) => Ok(pb.id),
            Entity::MultipleBirth(mb) => Ok(mb.pair_bond),
            other => Err(Error::wrong_kind(
                target,
                "pair_bond or multiple_birth",
                other.kind(),
            )),
        }
    }

    /// The pair-bond a person is a child of, if any.
    #[must_use]
    pub fn parents_of(&self, person: EntityId) -> Option<EntityId> {
        let child_of = self.person(person).ok()?.child_of?;
        let target = self.child_of(child_of).ok()?.target;
        self.parent_pair_bond(target).ok()
    }

    /// The multiple birth a person belongs to, if any.
    #[must_use]
    pub fn multiple_birth_of(&self, person: EntityId) -> Option<EntityId> {
        let child_of = self.person(person).ok()?.child_of?;
        let target = self.child_of(child_of).ok()?.target;
        self.multiple_birth(target).ok().map(|mb| mb.id)
    }

    /// Children of a pair-bond, direct and via multiple births, in id order.
    #[must_use]
    pub fn children_of(&self, pair_bond: EntityId) -> Vec<EntityId> {
        let Ok(pb) = self.pair_bond(pair_bond) else {
            return Vec::new();
        };
        let via_groups = pb
            .multiple_births
            .iter()
            .filter_map(|mb| self.multiple_birth(*mb).ok())
            .flat_map(|mb| mb.child_ofs.iter());
        let mut children: Vec<EntityId> = pb
            .child_ofs
            .iter()
            .chain(via_groups)
            .filter_map(|c| self.child_of(*c).ok().map(|c| c.person))
            .collect();
        children.sort();
        children
    }

    /// Events attached to a person, pair-bond, or emotion.
    #[must_use]
    pub fn events_of(&self, parent: EntityId) -> Vec<EntityId> {
        match self.resolve(parent) {
            Some(Entity::Person(p)) => p.events.iter().copied().collect(),
            Some(Entity::PairBond(pb)) => pb.events.iter().copied().collect(),
            Some(Entity::Emotion(e)) => e.events.iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// Ids of every live person.
    #[must_use]
    pub fn people(&self) -> Vec<EntityId> {
        self.iter_kind(EntityKind::Person).map(Relational::id).collect()
    }

    /// Ids of every live pair-bond.
    #[must_use]
    pub fn pair_bonds(&self) -> Vec<EntityId> {
        self.iter_kind(EntityKind::PairBond)
            .map(Relational::id)
            .collect()
    }
}
