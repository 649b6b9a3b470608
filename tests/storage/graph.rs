//! Integration tests for entity insertion, removal, and queries

use genogram_storage::{
    Change, ChildOf, Emotion, Entity, EntityId, EntityKind, ErrorKind, Event, EventKind, Graph,
    Layer, PairBond, Person, RelationshipKind,
};

use crate::{couple, person};

// =============================================================================
// Insertion
// =============================================================================

#[test]
fn insert_wires_back_references() {
    let c = couple();
    let a = c.graph.person(c.a).unwrap();
    assert!(a.pair_bonds().contains(&c.bond));
    assert!(c.graph.person(c.b).unwrap().pair_bonds().contains(&c.bond));
    assert_eq!(c.graph.pair_bonds(), vec![c.bond]);
    c.graph.validate().unwrap();
}

#[test]
fn duplicate_ids_are_refused() {
    let mut c = couple();
    let err = c.graph.insert(Entity::Person(Person::new(c.a))).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DuplicateId(_)));
}

#[test]
fn references_must_resolve_to_the_right_kind() {
    let mut c = couple();
    let id = c.graph.allocate_id();
    let before = c.graph.clone();
    assert!(
        c.graph
            .insert(Entity::PairBond(PairBond::new(id, c.a, EntityId::new(99))))
            .is_err()
    );
    assert!(
        c.graph
            .insert(Entity::ChildOf(ChildOf::new(id, c.a, c.a)))
            .is_err()
    );
    assert_eq!(c.graph, before);
}

#[test]
fn pair_bond_needs_two_people() {
    let mut graph = Graph::new();
    let a = person(&mut graph);
    let id = graph.allocate_id();
    let err = graph
        .insert(Entity::PairBond(PairBond::new(id, a, a)))
        .unwrap_err();
    assert!(err.is_invariant_violation());
}

#[test]
fn emotion_arity_follows_kind() {
    let mut c = couple();
    let id = c.graph.allocate_id();
    assert!(
        c.graph
            .insert(Entity::Emotion(Emotion::new(
                id,
                RelationshipKind::Conflict,
                c.a,
                None
            )))
            .is_err()
    );
    c.graph
        .insert(Entity::Emotion(Emotion::new(
            id,
            RelationshipKind::Cutoff,
            c.a,
            None,
        )))
        .unwrap();
    assert!(c.graph.person(c.a).unwrap().emotions().contains(&id));
}

#[test]
fn built_in_events_are_unique_per_owner() {
    let mut c = couple();
    let first = c.graph.allocate_id();
    c.graph
        .insert(Entity::Event(Event::new(first, EventKind::Birth, c.a)))
        .unwrap();
    let second = c.graph.allocate_id();
    assert!(
        c.graph
            .insert(Entity::Event(Event::new(second, EventKind::Birth, c.a)))
            .is_err()
    );
    c.graph
        .insert(Entity::Event(Event::new(second, EventKind::Moved, c.bond)))
        .unwrap();
    let third = c.graph.allocate_id();
    c.graph
        .insert(Entity::Event(Event::new(third, EventKind::Moved, c.bond)))
        .unwrap();
    assert_eq!(c.graph.events_of(c.bond), vec![second, third]);
}

#[test]
fn events_only_attach_to_their_owner_kinds() {
    let mut c = couple();
    let id = c.graph.allocate_id();
    assert!(
        c.graph
            .insert(Entity::Event(Event::new(id, EventKind::Married, c.a)))
            .is_err()
    );
}

#[test]
fn layer_orders_are_unique() {
    let mut graph = Graph::new();
    let one = graph.allocate_id();
    graph.insert(Entity::Layer(Layer::new(one, "One", 0))).unwrap();
    let two = graph.allocate_id();
    assert!(graph.insert(Entity::Layer(Layer::new(two, "Two", 0))).is_err());
    graph.insert(Entity::Layer(Layer::new(two, "Two", 1))).unwrap();
    let names: Vec<&str> = graph.layers().iter().map(|l| l.name()).collect();
    assert_eq!(names, vec!["One", "Two"]);
}

// =============================================================================
// Removal
// =============================================================================

#[test]
fn remove_refuses_while_dependents_remain() {
    let mut c = couple();
    assert!(c.graph.remove(c.a).is_err());
    assert!(c.graph.contains(c.a));
}

#[test]
fn remove_unlinks_and_snapshots() {
    let mut c = couple();
    c.graph
        .set_base(c.bond, "married", false.into())
        .unwrap();
    let snapshot = c.graph.remove(c.bond).unwrap();
    assert_eq!(snapshot.kind(), EntityKind::PairBond);
    assert_eq!(snapshot.properties.get("married"), Some(&false.into()));
    assert!(c.graph.person(c.a).unwrap().pair_bonds().is_empty());
    assert!(c.graph.resolve(c.bond).is_none());

    c.graph.attach(snapshot).unwrap();
    assert!(c.graph.person(c.a).unwrap().pair_bonds().contains(&c.bond));
    assert_eq!(c.graph.property(c.bond, "married").unwrap(), false.into());
}

#[test]
fn removed_ids_are_never_reallocated() {
    let mut graph = Graph::new();
    let a = person(&mut graph);
    graph.remove(a).unwrap();
    assert_ne!(graph.allocate_id(), a);
}

// =============================================================================
// Notifications and queries
// =============================================================================

#[test]
fn changes_are_queued_and_drained() {
    let mut c = couple();
    let changes = c.graph.drain_changes();
    assert!(changes.contains(&Change::Added(c.bond)));
    assert!(c.graph.drain_changes().is_empty());

    c.graph.set_base(c.a, "name", "Ann".into()).unwrap();
    assert_eq!(
        c.graph.drain_changes(),
        vec![Change::Property {
            entity: c.a,
            name: "name".into()
        }]
    );
}

#[test]
fn tags_are_found_by_name() {
    let mut c = couple();
    c.graph
        .set_tags(["kin".to_string()].into_iter().collect());
    c.graph
        .set_base(c.a, "tags", vec!["kin"].into())
        .unwrap();
    assert_eq!(c.graph.find_by_tag("kin"), vec![c.a]);
    assert_eq!(c.graph.entity_tags(c.a), vec!["kin".to_string()]);
    assert!(c.graph.find_by_tag("other").is_empty());
}

#[test]
fn graph_equality_ignores_change_queue() {
    let c = couple();
    let mut other = c.graph.clone();
    other.drain_changes();
    assert_eq!(other, c.graph);
}
