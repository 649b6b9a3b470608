//! Integration tests for Layer 3: Runtime
//!
//! Tests for reading and writing whole diagrams, load-time pruning, file
//! encodings, and sessions.

mod files;
mod pruning;

use genogram_history::{Document, DocumentConfig};
use genogram_storage::{Entity, EntityId, EventKind, PairBond, Person, RelationshipKind, Value, ValueType};

/// Ids of the interesting entities in [`sample`].
pub struct Sample {
    pub doc: Document,
    pub mother: EntityId,
    pub bond: EntityId,
    pub twins: [EntityId; 2],
    pub youngest: EntityId,
    pub layer: EntityId,
}

/// A family touching every entity kind, with overrides, tags, an event
/// property, and a pending proposal.
pub fn sample() -> Sample {
    let mut doc = Document::with_config(DocumentConfig::unbounded());
    let mother = doc.add_person(Some("Mae")).unwrap();
    let father = doc.add_person(Some("Abe")).unwrap();
    let bond = doc.add_pair_bond(mother, father).unwrap();
    doc.add_event(EventKind::Married, bond).unwrap();

    let first = doc.add_person(Some("Tia")).unwrap();
    doc.set_parents(first, Some(bond)).unwrap();
    let second = doc.add_person(Some("Tom")).unwrap();
    doc.set_parents(second, Some(first)).unwrap();
    let youngest = doc.add_person(Some("Lu")).unwrap();
    doc.set_parents(youngest, Some(bond)).unwrap();

    let conflict = doc
        .add_emotion(RelationshipKind::Conflict, mother, Some(father))
        .unwrap();
    doc.add_emotion(RelationshipKind::Cutoff, youngest, None)
        .unwrap();
    let attr = doc.add_extension("Anxiety", ValueType::Int).unwrap();
    let shift = doc.add_event(EventKind::VariableShift, conflict).unwrap();
    doc.set_property(shift, &attr, Value::Int(4)).unwrap();

    doc.add_tag("focus").unwrap();
    doc.tag_entity(youngest, "focus").unwrap();

    let layer = doc.add_layer("Session 1").unwrap();
    doc.set_layer_store_geometry(layer, true).unwrap();
    doc.set_layer_active(layer, true).unwrap();
    doc.set_property(mother, "item_pos", Value::point(-40.0, 0.0))
        .unwrap();
    doc.set_property(mother, "color", "teal".into()).unwrap();
    doc.set_layer_active(layer, false).unwrap();

    let stranger = doc.allocate_id();
    doc.propose(Entity::Person(Person::new(stranger))).unwrap();
    let maybe = doc.allocate_id();
    doc.propose(Entity::PairBond(PairBond::new(maybe, stranger, father)))
        .unwrap();

    doc.validate().unwrap();
    Sample {
        doc,
        mother,
        bond,
        twins: [first, second],
        youngest,
        layer,
    }
}
