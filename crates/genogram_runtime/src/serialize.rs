//! The persisted diagram format.
//!
//! A diagram is written as a flat list of records, one per entity, each
//! tagged with its kind and holding raw ids for its references. Reading is
//! two passes:
//!
//! 1. every record is entered into a shell table of `id -> kind`
//! 2. every stored id is resolved through that table, and records whose
//!    references are missing or of the wrong kind are dropped; dropping one
//!    can strand another, so this repeats until nothing changes
//!
//! The surviving records are attached in restore rank, overlay rows and
//! proposed ids are pruned the same way, and multiple births left with fewer
//! than two members are dissolved. Nothing is silently lost: every drop is
//! logged and listed in the [`ReadReport`].

use std::collections::{BTreeMap, BTreeSet};

use genogram_foundation::{
    EntityId, EntityKind, Error, ErrorKind, EventKind, RelationshipKind, Result, Value,
};
use genogram_storage::{
    ChildOf, Emotion, Entity, EntitySnapshot, Event, ExtensionRegistry, Graph, Layer,
    MultipleBirth, PairBond, Person, PropertyRow, Relational,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Property values keyed by name.
pub type PropertyMap = BTreeMap<String, Value>;

/// A whole diagram, ready for a serde format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramData {
    /// Format version.
    pub version: u32,
    /// One record per entity.
    #[serde(default)]
    pub items: Vec<Record>,
    /// Override rows: layer id to entity id to values.
    #[serde(default)]
    pub layers: BTreeMap<EntityId, BTreeMap<EntityId, PropertyMap>>,
    /// The tag registry.
    #[serde(default)]
    pub tags: Vec<String>,
    /// The event extension property registry.
    #[serde(default)]
    pub extensions: ExtensionRegistry,
    /// Ids of proposed entities.
    #[serde(default)]
    pub proposed: Vec<EntityId>,
    /// Number of entries pruned when this diagram was last read.
    #[serde(default)]
    pub pruned: usize,
}

/// One persisted entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Entity id.
    pub id: EntityId,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub item: Item,
    /// Base property values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// Kind-specific record fields, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[allow(missing_docs)]
pub enum Item {
    Person,
    PairBond {
        person_a: EntityId,
        person_b: EntityId,
    },
    ChildOf {
        person: EntityId,
        target: EntityId,
    },
    MultipleBirth {
        pair_bond: EntityId,
    },
    Emotion {
        relationship: RelationshipKind,
        person_a: EntityId,
        #[serde(default)]
        person_b: Option<EntityId>,
    },
    Event {
        event_kind: EventKind,
        parent: EntityId,
    },
    Layer {
        name: String,
        order: u32,
        #[serde(default)]
        active: bool,
        #[serde(default)]
        store_geometry: bool,
    },
}

impl Item {
    fn kind(&self) -> EntityKind {
        match self {
            Self::Person => EntityKind::Person,
            Self::PairBond { .. } => EntityKind::PairBond,
            Self::ChildOf { .. } => EntityKind::ChildOf,
            Self::MultipleBirth { .. } => EntityKind::MultipleBirth,
            Self::Emotion { .. } => EntityKind::Emotion,
            Self::Event { .. } => EntityKind::Event,
            Self::Layer { .. } => EntityKind::Layer,
        }
    }

    fn from_entity(entity: &Entity) -> Self {
        match entity {
            Entity::Person(_) => Self::Person,
            Entity::PairBond(pb) => {
                let (person_a, person_b) = pb.people();
                Self::PairBond { person_a, person_b }
            }
            Entity::ChildOf(link) => Self::ChildOf {
                person: link.person(),
                target: link.target(),
            },
            Entity::MultipleBirth(mb) => Self::MultipleBirth {
                pair_bond: mb.pair_bond(),
            },
            Entity::Emotion(emotion) => {
                let (person_a, person_b) = emotion.people();
                Self::Emotion {
                    relationship: emotion.relationship(),
                    person_a,
                    person_b,
                }
            }
            Entity::Event(event) => Self::Event {
                event_kind: event.event_kind(),
                parent: event.parent(),
            },
            Entity::Layer(layer) => Self::Layer {
                name: layer.name().to_string(),
                order: layer.order(),
                active: layer.is_active(),
                store_geometry: layer.stores_geometry(),
            },
        }
    }

    fn to_entity(&self, id: EntityId) -> Entity {
        match self {
            Self::Person => Entity::Person(Person::new(id)),
            Self::PairBond { person_a, person_b } => {
                Entity::PairBond(PairBond::new(id, *person_a, *person_b))
            }
            Self::ChildOf { person, target } => Entity::ChildOf(ChildOf::new(id, *person, *target)),
            Self::MultipleBirth { pair_bond } => {
                Entity::MultipleBirth(MultipleBirth::new(id, *pair_bond))
            }
            Self::Emotion {
                relationship,
                person_a,
                person_b,
            } => Entity::Emotion(Emotion::new(id, *relationship, *person_a, *person_b)),
            Self::Event { event_kind, parent } => {
                Entity::Event(Event::new(id, *event_kind, *parent))
            }
            Self::Layer {
                name,
                order,
                active,
                store_geometry,
            } => Entity::Layer(
                Layer::new(id, name.clone(), *order)
                    .with_active(*active)
                    .with_store_geometry(*store_geometry),
            ),
        }
    }
}

/// Something dropped while reading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pruned {
    /// A record whose reference did not resolve to an acceptable entity.
    StaleReference {
        /// The dropped record.
        id: EntityId,
        /// Its kind.
        kind: EntityKind,
        /// The reference field.
        field: &'static str,
        /// The unresolved target.
        target: EntityId,
    },
    /// A record the graph refused to attach.
    Rejected {
        /// The dropped record.
        id: EntityId,
        /// Its kind.
        kind: EntityKind,
        /// Why it was refused.
        reason: String,
    },
    /// An override row for a missing layer or entity.
    Override {
        /// The layer id as stored.
        layer: EntityId,
        /// The entity id as stored.
        entity: EntityId,
    },
    /// A property value the schema does not accept.
    Property {
        /// The owning entity.
        entity: EntityId,
        /// The property name.
        name: String,
    },
    /// A proposed id that is not a live entity.
    Proposed(EntityId),
}

/// What reading a diagram dropped or repaired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// Every pruned entry, in the order found.
    pub pruned: Vec<Pruned>,
    /// Multiple births dissolved for having fewer than two members.
    pub dissolved: Vec<EntityId>,
}

impl ReadReport {
    /// Total number of pruned entries.
    #[must_use]
    pub fn pruned_count(&self) -> usize {
        self.pruned.len()
    }

    /// Returns true if the diagram was read without any repair.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.pruned.is_empty() && self.dissolved.is_empty()
    }

    fn prune(&mut self, entry: Pruned) {
        warn!(?entry, "pruned while reading diagram");
        self.pruned.push(entry);
    }
}

// =============================================================================
// Writing
// =============================================================================

impl DiagramData {
    /// Captures every committed and proposed entity of a graph.
    #[must_use]
    pub fn from_graph(graph: &Graph) -> Self {
        let items = graph
            .iter()
            .map(|entity| Record {
                id: entity.id(),
                item: Item::from_entity(entity),
                properties: graph
                    .base_row(entity.id())
                    .map(to_map)
                    .unwrap_or_default(),
            })
            .collect();
        let layers = graph
            .layers()
            .into_iter()
            .filter(|layer| !layer.overrides().is_empty())
            .map(|layer| {
                let rows = layer
                    .overrides()
                    .iter()
                    .map(|(entity, row)| (*entity, to_map(row)))
                    .collect();
                (layer.id(), rows)
            })
            .collect();
        Self {
            version: FORMAT_VERSION,
            items,
            layers,
            tags: graph.tags().iter().cloned().collect(),
            extensions: graph.extensions().clone(),
            proposed: graph.proposed_ids(),
            pruned: 0,
        }
    }

    /// Records how many entries the read that produced the graph pruned.
    #[must_use]
    pub fn with_pruned(mut self, pruned: usize) -> Self {
        self.pruned = pruned;
        self
    }
}

fn to_map(row: &PropertyRow) -> PropertyMap {
    row.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// Captures a graph for writing.
#[must_use]
pub fn write(graph: &Graph) -> DiagramData {
    DiagramData::from_graph(graph)
}

// =============================================================================
// Reading
// =============================================================================

/// Rebuilds a graph from persisted data, pruning what no longer resolves.
///
/// # Errors
///
/// Returns `DuplicateId` if two records share an id, and `Serialization` for
/// an unsupported format version. Stale references are never errors.
pub fn read(data: &DiagramData) -> Result<(Graph, ReadReport)> {
    if data.version > FORMAT_VERSION {
        return Err(Error::new(ErrorKind::Serialization(format!(
            "unsupported format version {} (newest known is {FORMAT_VERSION})",
            data.version
        ))));
    }
    let mut report = ReadReport::default();

    // Pass 1: shells.
    let mut shells: BTreeMap<EntityId, EntityKind> = BTreeMap::new();
    for record in &data.items {
        if shells.insert(record.id, record.item.kind()).is_some() {
            return Err(Error::duplicate_id(record.id));
        }
    }

    // Pass 2: resolve to a fixpoint.
    let mut entities: BTreeMap<EntityId, (Entity, &Record)> = data
        .items
        .iter()
        .map(|record| (record.id, (record.item.to_entity(record.id), record)))
        .collect();
    loop {
        let stale: Vec<(EntityId, EntityKind, &'static str, EntityId)> = entities
            .values()
            .filter_map(|(entity, _)| {
                entity
                    .references()
                    .into_iter()
                    .find(|r| {
                        shells
                            .get(&r.target)
                            .is_none_or(|kind| !r.accepts.contains(kind))
                    })
                    .map(|r| (entity.id(), entity.kind(), r.field, r.target))
            })
            .collect();
        if stale.is_empty() {
            break;
        }
        for (id, kind, field, target) in stale {
            shells.remove(&id);
            entities.remove(&id);
            report.prune(Pruned::StaleReference {
                id,
                kind,
                field,
                target,
            });
        }
    }

    let mut graph = Graph::new();
    for spec in data.extensions.iter() {
        if let Err(err) = graph.add_extension(None, spec.clone()) {
            warn!(attr = %spec.attr, %err, "skipping extension property");
        }
    }
    graph.set_tags(data.tags.iter().cloned().collect());

    let proposed = proposed_closure(data, &entities, &mut report);
    let entities = densify_layer_orders(entities);
    let mut ordered: Vec<(Entity, &Record)> = entities.into_values().collect();
    ordered.sort_by_key(|(entity, _)| (entity.rank(), entity.id()));

    for (entity, record) in ordered {
        let id = entity.id();
        let kind = entity.kind();
        let properties = checked_properties(&graph, kind, record, &mut report);
        let snapshot = EntitySnapshot::new(entity)
            .with_properties(properties)
            .with_proposed(proposed.contains(&id));
        if let Err(err) = graph.attach(snapshot) {
            report.prune(Pruned::Rejected {
                id,
                kind,
                reason: err.to_string(),
            });
        }
    }

    restore_overlays(&mut graph, data, &mut report);
    dissolve_small_groups(&mut graph, &mut report)?;
    graph.drain_changes();
    debug!(
        entities = graph.len(),
        pruned = report.pruned_count(),
        dissolved = report.dissolved.len(),
        "read diagram"
    );
    Ok((graph, report))
}

/// Proposed ids that survive, plus every record referencing one of them.
fn proposed_closure(
    data: &DiagramData,
    entities: &BTreeMap<EntityId, (Entity, &Record)>,
    report: &mut ReadReport,
) -> BTreeSet<EntityId> {
    let mut proposed = BTreeSet::new();
    for id in &data.proposed {
        if entities.contains_key(id) {
            proposed.insert(*id);
        } else {
            report.prune(Pruned::Proposed(*id));
        }
    }
    let mut by_rank: Vec<&Entity> = entities.values().map(|(entity, _)| entity).collect();
    by_rank.sort_by_key(|entity| (entity.rank(), entity.id()));
    for entity in by_rank {
        if !proposed.contains(&entity.id())
            && entity
                .references()
                .iter()
                .any(|r| proposed.contains(&r.target))
        {
            warn!(id = %entity.id(), "marking entity proposed: it references a proposal");
            proposed.insert(entity.id());
        }
    }
    proposed
}

/// Renumbers layer orders densely, keeping their relative order.
fn densify_layer_orders(
    mut entities: BTreeMap<EntityId, (Entity, &Record)>,
) -> BTreeMap<EntityId, (Entity, &Record)> {
    let mut layers: Vec<(u32, EntityId)> = entities
        .values()
        .filter_map(|(entity, _)| entity.as_layer().map(|l| (l.order(), l.id())))
        .collect();
    layers.sort_unstable();
    for (index, (order, id)) in layers.into_iter().enumerate() {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        if index == order {
            continue;
        }
        if let Some((Entity::Layer(layer), _)) = entities.get_mut(&id) {
            debug!(%id, from = order, to = index, "renumbering layer");
            *layer = layer.reordered(index);
        }
    }
    entities
}

fn checked_properties(
    graph: &Graph,
    kind: EntityKind,
    record: &Record,
    report: &mut ReadReport,
) -> PropertyRow {
    let mut row = PropertyRow::new();
    for (name, value) in &record.properties {
        match graph.property_info(kind, name) {
            Ok(info) if info.ty.accepts(value) => {
                row.insert(name.clone(), value.clone());
            }
            _ => report.prune(Pruned::Property {
                entity: record.id,
                name: name.clone(),
            }),
        }
    }
    row
}

fn restore_overlays(graph: &mut Graph, data: &DiagramData, report: &mut ReadReport) {
    for (layer_id, rows) in &data.layers {
        let store_geometry = match graph.layer(*layer_id) {
            Ok(layer) => layer.stores_geometry(),
            Err(_) => {
                for entity in rows.keys() {
                    report.prune(Pruned::Override {
                        layer: *layer_id,
                        entity: *entity,
                    });
                }
                continue;
            }
        };
        for (entity, values) in rows {
            let Some(kind) = graph.kind_of(*entity) else {
                report.prune(Pruned::Override {
                    layer: *layer_id,
                    entity: *entity,
                });
                continue;
            };
            let mut row = PropertyRow::new();
            for (name, value) in values {
                match graph.property_info(kind, name) {
                    Ok(info)
                        if info.layered
                            && info.ty.accepts(value)
                            && (store_geometry || !info.geometry) =>
                    {
                        row.insert(name.clone(), value.clone());
                    }
                    _ => report.prune(Pruned::Property {
                        entity: *entity,
                        name: name.clone(),
                    }),
                }
            }
            if !row.is_empty() {
                graph.restore_overrides(*entity, &BTreeMap::from([(*layer_id, row)]));
            }
        }
    }
}

fn dissolve_small_groups(graph: &mut Graph, report: &mut ReadReport) -> Result<()> {
    let groups: Vec<EntityId> = graph
        .iter_kind(EntityKind::MultipleBirth)
        .filter(|entity| {
            entity
                .as_multiple_birth()
                .is_some_and(|mb| mb.child_ofs().len() < 2)
        })
        .map(Relational::id)
        .collect();
    for group in groups {
        let mb = graph.multiple_birth(group)?;
        let pair_bond = mb.pair_bond();
        let survivor = mb.child_ofs().iter().next().copied();
        warn!(%group, %pair_bond, "dissolving multiple birth with fewer than two members");
        match survivor {
            Some(link) => {
                let person = graph.child_of(link)?.person();
                graph.set_parents(person, Some(pair_bond))?;
            }
            None => {
                graph.remove(group)?;
            }
        }
        report.dissolved.push(group);
    }
    Ok(())
}
