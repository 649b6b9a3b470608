//! Entity variants and their relational capabilities.
//!
//! Every cross-entity link is an [`EntityId`]. Forward references (a child
//! link's person and target, a pair-bond's endpoints, an event's parent) are
//! owned by the referencing entity; the referenced entity keeps a sorted
//! back-reference set of its dependents, maintained by the [`Graph`].
//!
//! [`Graph`]: crate::Graph

use std::collections::BTreeSet;

use genogram_foundation::{EntityId, EntityKind, EventKind, RelationshipKind, Value};
use im::OrdMap;

use crate::property::PropertyRow;

/// A forward reference declared by an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Field name, used in diagnostics and persisted records.
    pub field: &'static str,
    /// Referenced entity.
    pub target: EntityId,
    /// Kinds the target may have.
    pub accepts: &'static [EntityKind],
}

impl Reference {
    const fn new(field: &'static str, target: EntityId, accepts: &'static [EntityKind]) -> Self {
        Self {
            field,
            target,
            accepts,
        }
    }
}

/// Capability shared by every entity variant.
///
/// The cascade walker and the delta engine only go through this trait, so
/// they stay a single generic traversal over all kinds.
pub trait Relational {
    /// Returns the entity id.
    fn id(&self) -> EntityId;

    /// Returns the entity kind.
    fn kind(&self) -> EntityKind;

    /// Returns every forward reference.
    fn references(&self) -> Vec<Reference>;

    /// Returns every entity that references this one.
    fn dependents(&self) -> Vec<EntityId>;

    /// Returns true if anything still references this entity.
    fn has_dependents(&self) -> bool {
        !self.dependents().is_empty()
    }

    /// Records a dependent. Returns false if this kind cannot hold it.
    fn attach_dependent(&mut self, kind: EntityKind, id: EntityId) -> bool;

    /// Forgets a dependent. Returns false if it was not recorded.
    fn detach_dependent(&mut self, id: EntityId) -> bool;

    /// Forgets every dependent.
    fn clear_dependents(&mut self);

    /// Restore rank of this entity.
    fn rank(&self) -> u8 {
        self.kind().rank()
    }
}

/// An individual.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub(crate) id: EntityId,
    pub(crate) child_of: Option<EntityId>,
    pub(crate) pair_bonds: BTreeSet<EntityId>,
    pub(crate) emotions: BTreeSet<EntityId>,
    pub(crate) events: BTreeSet<EntityId>,
}

impl Person {
    /// Creates a person with no relationships.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            child_of: None,
            pair_bonds: BTreeSet::new(),
            emotions: BTreeSet::new(),
            events: BTreeSet::new(),
        }
    }

    /// The person's child link, if any.
    #[must_use]
    pub fn child_of(&self) -> Option<EntityId> {
        self.child_of
    }

    /// Pair-bonds this person is an endpoint of.
    #[must_use]
    pub fn pair_bonds(&self) -> &BTreeSet<EntityId> {
        &self.pair_bonds
    }

    /// Emotions this person is an endpoint of.
    #[must_use]
    pub fn emotions(&self) -> &BTreeSet<EntityId> {
        &self.emotions
    }

    /// Events attached to this person.
    #[must_use]
    pub fn events(&self) -> &BTreeSet<EntityId> {
        &self.events
    }
}

/// A marriage or committed partnership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PairBond {
    pub(crate) id: EntityId,
    pub(crate) person_a: EntityId,
    pub(crate) person_b: EntityId,
    pub(crate) child_ofs: BTreeSet<EntityId>,
    pub(crate) multiple_births: BTreeSet<EntityId>,
    pub(crate) events: BTreeSet<EntityId>,
}

impl PairBond {
    /// Creates a pair-bond between two people.
    #[must_use]
    pub fn new(id: EntityId, person_a: EntityId, person_b: EntityId) -> Self {
        Self {
            id,
            person_a,
            person_b,
            child_ofs: BTreeSet::new(),
            multiple_births: BTreeSet::new(),
            events: BTreeSet::new(),
        }
    }

    /// Both endpoints.
    #[must_use]
    pub fn people(&self) -> (EntityId, EntityId) {
        (self.person_a, self.person_b)
    }

    /// Returns true if `person` is an endpoint.
    #[must_use]
    pub fn has_endpoint(&self, person: EntityId) -> bool {
        self.person_a == person || self.person_b == person
    }

    /// Child links pointing directly at this pair-bond.
    #[must_use]
    pub fn child_ofs(&self) -> &BTreeSet<EntityId> {
        &self.child_ofs
    }

    /// Multiple-birth groups of this pair-bond.
    #[must_use]
    pub fn multiple_births(&self) -> &BTreeSet<EntityId> {
        &self.multiple_births
    }

    /// Events attached to this pair-bond.
    #[must_use]
    pub fn events(&self) -> &BTreeSet<EntityId> {
        &self.events
    }
}

/// "Is a child of" edge owned by a person.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildOf {
    pub(crate) id: EntityId,
    pub(crate) person: EntityId,
    pub(crate) target: EntityId,
}

impl ChildOf {
    /// Creates a child link from `person` to a pair-bond or multiple birth.
    #[must_use]
    pub fn new(id: EntityId, person: EntityId, target: EntityId) -> Self {
        Self { id, person, target }
    }

    /// The child.
    #[must_use]
    pub fn person(&self) -> EntityId {
        self.person
    }

    /// The pair-bond or multiple birth this link points at.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Returns a copy pointing at a different target.
    #[must_use]
    pub fn retargeted(&self, target: EntityId) -> Self {
        Self {
            target,
            ..self.clone()
        }
    }
}

/// Group of two or more children born together.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipleBirth {
    pub(crate) id: EntityId,
    pub(crate) pair_bond: EntityId,
    pub(crate) child_ofs: BTreeSet<EntityId>,
}

impl MultipleBirth {
    /// Creates an empty group under a pair-bond.
    #[must_use]
    pub fn new(id: EntityId, pair_bond: EntityId) -> Self {
        Self {
            id,
            pair_bond,
            child_ofs: BTreeSet::new(),
        }
    }

    /// The parents.
    #[must_use]
    pub fn pair_bond(&self) -> EntityId {
        self.pair_bond
    }

    /// Member child links, ordered by id.
    #[must_use]
    pub fn child_ofs(&self) -> &BTreeSet<EntityId> {
        &self.child_ofs
    }
}

/// Relationship-process link between one or two people.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emotion {
    pub(crate) id: EntityId,
    pub(crate) relationship: RelationshipKind,
    pub(crate) person_a: EntityId,
    pub(crate) person_b: Option<EntityId>,
    pub(crate) events: BTreeSet<EntityId>,
}

impl Emotion {
    /// Creates an emotion. Monadic kinds take `person_b = None`.
    #[must_use]
    pub fn new(
        id: EntityId,
        relationship: RelationshipKind,
        person_a: EntityId,
        person_b: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            relationship,
            person_a,
            person_b,
            events: BTreeSet::new(),
        }
    }

    /// The relationship kind.
    #[must_use]
    pub fn relationship(&self) -> RelationshipKind {
        self.relationship
    }

    /// The endpoints.
    #[must_use]
    pub fn people(&self) -> (EntityId, Option<EntityId>) {
        (self.person_a, self.person_b)
    }

    /// Events attached to this emotion.
    #[must_use]
    pub fn events(&self) -> &BTreeSet<EntityId> {
        &self.events
    }
}

/// A dated occurrence attached to a person, pair-bond, or emotion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub(crate) id: EntityId,
    pub(crate) kind: EventKind,
    pub(crate) parent: EntityId,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(id: EntityId, kind: EventKind, parent: EntityId) -> Self {
        Self { id, kind, parent }
    }

    /// The event kind.
    #[must_use]
    pub fn event_kind(&self) -> EventKind {
        self.kind
    }

    /// The owning entity.
    #[must_use]
    pub fn parent(&self) -> EntityId {
        self.parent
    }
}

/// A named alternate view with sparse property overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub(crate) id: EntityId,
    pub(crate) name: String,
    pub(crate) active: bool,
    pub(crate) order: u32,
    pub(crate) store_geometry: bool,
    pub(crate) overrides: OrdMap<EntityId, PropertyRow>,
}

impl Layer {
    /// Creates an inactive layer without overrides.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            active: false,
            order,
            store_geometry: false,
            overrides: OrdMap::new(),
        }
    }

    /// Sets the active flag (builder form, for construction and loading).
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Sets the geometry flag (builder form).
    #[must_use]
    pub fn with_store_geometry(mut self, store_geometry: bool) -> Self {
        self.store_geometry = store_geometry;
        self
    }

    /// Returns a copy with a different order index.
    #[must_use]
    pub fn reordered(&self, order: u32) -> Self {
        Self {
            order,
            ..self.clone()
        }
    }

    /// The layer id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the layer participates in property resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Dense order index; higher wins.
    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Whether the layer may override geometry properties.
    #[must_use]
    pub fn stores_geometry(&self) -> bool {
        self.store_geometry
    }

    /// The overlay table.
    #[must_use]
    pub fn overrides(&self) -> &OrdMap<EntityId, PropertyRow> {
        &self.overrides
    }

    /// Looks up one override.
    #[must_use]
    pub fn get_override(&self, entity: EntityId, name: &str) -> Option<&Value> {
        self.overrides.get(&entity).and_then(|row| row.get(name))
    }
}

/// Closed set of graph entities.
#[derive(Clone, Debug, PartialEq)]
pub enum Entity {
    /// See [`Person`].
    Person(Person),
    /// See [`PairBond`].
    PairBond(PairBond),
    /// See [`ChildOf`].
    ChildOf(ChildOf),
    /// See [`MultipleBirth`].
    MultipleBirth(MultipleBirth),
    /// See [`Emotion`].
    Emotion(Emotion),
    /// See [`Event`].
    Event(Event),
    /// See [`Layer`].
    Layer(Layer),
}

impl Entity {
    /// Returns the person, if this is one.
    #[must_use]
    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Self::Person(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the pair-bond, if this is one.
    #[must_use]
    pub fn as_pair_bond(&self) -> Option<&PairBond> {
        match self {
            Self::PairBond(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the child link, if this is one.
    #[must_use]
    pub fn as_child_of(&self) -> Option<&ChildOf> {
        match self {
            Self::ChildOf(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the multiple birth, if this is one.
    #[must_use]
    pub fn as_multiple_birth(&self) -> Option<&MultipleBirth> {
        match self {
            Self::MultipleBirth(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the emotion, if this is one.
    #[must_use]
    pub fn as_emotion(&self) -> Option<&Emotion> {
        match self {
            Self::Emotion(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the event, if this is one.
    #[must_use]
    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Self::Event(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the layer, if this is one.
    #[must_use]
    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            Self::Layer(l) => Some(l),
            _ => None,
        }
    }
}

const PERSON_ONLY: &[EntityKind] = &[EntityKind::Person];
const PARENT_TARGETS: &[EntityKind] = &[EntityKind::PairBond, EntityKind::MultipleBirth];
const PAIR_BOND_ONLY: &[EntityKind] = &[EntityKind::PairBond];

fn remove_from(set: &mut BTreeSet<EntityId>, id: EntityId) -> bool {
    set.remove(&id)
}

impl Relational for Entity {
    fn id(&self) -> EntityId {
        match self {
            Self::Person(e) => e.id,
            Self::PairBond(e) => e.id,
            Self::ChildOf(e) => e.id,
            Self::MultipleBirth(e) => e.id,
            Self::Emotion(e) => e.id,
            Self::Event(e) => e.id,
            Self::Layer(e) => e.id,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            Self::Person(_) => EntityKind::Person,
            Self::PairBond(_) => EntityKind::PairBond,
            Self::ChildOf(_) => EntityKind::ChildOf,
            Self::MultipleBirth(_) => EntityKind::MultipleBirth,
            Self::Emotion(_) => EntityKind::Emotion,
            Self::Event(_) => EntityKind::Event,
            Self::Layer(_) => EntityKind::Layer,
        }
    }

    fn references(&self) -> Vec<Reference> {
        match self {
            Self::Person(_) | Self::Layer(_) => Vec::new(),
            Self::PairBond(pb) => vec![
                Reference::new("person_a", pb.person_a, PERSON_ONLY),
                Reference::new("person_b", pb.person_b, PERSON_ONLY),
            ],
            Self::ChildOf(c) => vec![
                Reference::new("person", c.person, PERSON_ONLY),
                Reference::new("target", c.target, PARENT_TARGETS),
            ],
            Self::MultipleBirth(mb) => {
                vec![Reference::new("pair_bond", mb.pair_bond, PAIR_BOND_ONLY)]
            }
            Self::Emotion(e) => {
                let mut refs = vec![Reference::new("person_a", e.person_a, PERSON_ONLY)];
                if let Some(b) = e.person_b {
                    refs.push(Reference::new("person_b", b, PERSON_ONLY));
                }
                refs
            }
            Self::Event(ev) => vec![Reference::new("parent", ev.parent, ev.kind.parent_kinds())],
        }
    }

    fn dependents(&self) -> Vec<EntityId> {
        match self {
            Self::Person(p) => p
                .child_of
                .iter()
                .chain(&p.pair_bonds)
                .chain(&p.emotions)
                .chain(&p.events)
                .copied()
                .collect(),
            Self::PairBond(pb) => pb
                .child_ofs
                .iter()
                .chain(&pb.multiple_births)
                .chain(&pb.events)
                .copied()
                .collect(),
            Self::MultipleBirth(mb) => mb.child_ofs.iter().copied().collect(),
            Self::Emotion(e) => e.events.iter().copied().collect(),
            Self::ChildOf(_) | Self::Event(_) | Self::Layer(_) => Vec::new(),
        }
    }

    fn attach_dependent(&mut self, kind: EntityKind, id: EntityId) -> bool {
        match (self, kind) {
            (Self::Person(p), EntityKind::ChildOf) => match p.child_of {
                Some(existing) => existing == id,
                None => {
                    p.child_of = Some(id);
                    true
                }
            },
            (Self::Person(p), EntityKind::PairBond) => {
                p.pair_bonds.insert(id);
                true
            }
            (Self::Person(p), EntityKind::Emotion) => {
                p.emotions.insert(id);
                true
            }
            (Self::Person(p), EntityKind::Event) => {
                p.events.insert(id);
                true
            }
            (Self::PairBond(pb), EntityKind::ChildOf) => {
                pb.child_ofs.insert(id);
                true
            }
            (Self::PairBond(pb), EntityKind::MultipleBirth) => {
                pb.multiple_births.insert(id);
                true
            }
            (Self::PairBond(pb), EntityKind::Event) => {
                pb.events.insert(id);
                true
            }
            (Self::MultipleBirth(mb), EntityKind::ChildOf) => {
                mb.child_ofs.insert(id);
                true
            }
            (Self::Emotion(e), EntityKind::Event) => {
                e.events.insert(id);
                true
            }
            _ => false,
        }
    }

    fn detach_dependent(&mut self, id: EntityId) -> bool {
        match self {
            Self::Person(p) => {
                if p.child_of == Some(id) {
                    p.child_of = None;
                    return true;
                }
                remove_from(&mut p.pair_bonds, id)
                    || remove_from(&mut p.emotions, id)
                    || remove_from(&mut p.events, id)
            }
            Self::PairBond(pb) => {
                remove_from(&mut pb.child_ofs, id)
                    || remove_from(&mut pb.multiple_births, id)
                    || remove_from(&mut pb.events, id)
            }
            Self::MultipleBirth(mb) => remove_from(&mut mb.child_ofs, id),
            Self::Emotion(e) => remove_from(&mut e.events, id),
            Self::ChildOf(_) | Self::Event(_) | Self::Layer(_) => false,
        }
    }

    fn clear_dependents(&mut self) {
        match self {
            Self::Person(p) => {
                p.child_of = None;
                p.pair_bonds.clear();
                p.emotions.clear();
                p.events.clear();
            }
            Self::PairBond(pb) => {
                pb.child_ofs.clear();
                pb.multiple_births.clear();
                pb.events.clear();
            }
            Self::MultipleBirth(mb) => mb.child_ofs.clear(),
            Self::Emotion(e) => e.events.clear(),
            Self::ChildOf(_) | Self::Event(_) | Self::Layer(_) => {}
        }
    }
}
