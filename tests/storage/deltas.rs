//! Integration tests for structural deltas

use genogram_storage::{ChildOf, Delta, Entity, EntitySnapshot, ErrorKind, Relational, Value};

use crate::{couple, person};

#[test]
fn apply_and_revert_are_inverse() {
    let mut c = couple();
    let kid = person(&mut c.graph);
    let before = c.graph.clone();

    let link = c.graph.allocate_id();
    let mut delta = Delta::new();
    delta.record_after(EntitySnapshot::new(Entity::ChildOf(ChildOf::new(
        link, kid, c.bond,
    ))));
    assert_eq!(delta.added(), vec![link]);

    c.graph.apply_delta(&delta).unwrap();
    assert_eq!(c.graph.parents_of(kid), Some(c.bond));
    c.graph.revert_delta(&delta).unwrap();
    assert_eq!(c.graph, before);
    c.graph.apply_delta(&delta).unwrap();
    assert_eq!(c.graph.person(kid).unwrap().child_of(), Some(link));
}

#[test]
fn removal_delta_restores_dependents() {
    let mut c = couple();
    let kid = person(&mut c.graph);
    let delta = c.graph.set_parents(kid, Some(c.bond)).unwrap();
    let link = delta.added()[0];
    c.graph.set_base(c.bond, "married", false.into()).unwrap();
    let before = c.graph.clone();

    let mut removal = Delta::new();
    removal.record_before(c.graph.snapshot(link).unwrap());
    removal.record_before(c.graph.snapshot(c.bond).unwrap());
    assert_eq!(removal.removed().len(), 2);

    c.graph.apply_delta(&removal).unwrap();
    assert!(!c.graph.contains(c.bond));
    assert!(c.graph.person(c.a).unwrap().pair_bonds().is_empty());

    c.graph.revert_delta(&removal).unwrap();
    assert_eq!(c.graph, before);
    assert_eq!(c.graph.base_value(c.bond, "married"), Some(&Value::Bool(false)));
}

#[test]
fn applying_twice_fails_without_side_effects() {
    let mut c = couple();
    let mut removal = Delta::new();
    removal.record_before(c.graph.snapshot(c.bond).unwrap());
    c.graph.apply_delta(&removal).unwrap();
    let after = c.graph.clone();

    let err = c.graph.apply_delta(&removal).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CascadeFailed(_)));
    assert_eq!(c.graph, after);
}

#[test]
fn modified_ids_appear_on_both_sides() {
    let mut c = couple();
    let one = person(&mut c.graph);
    c.graph.set_parents(one, Some(c.bond)).unwrap();
    let two = person(&mut c.graph);
    c.graph.set_parents(two, Some(c.bond)).unwrap();

    let delta = c.graph.plan_set_parents(two, Some(one)).unwrap();
    let sibling_link = c.graph.person(one).unwrap().child_of().unwrap();
    assert!(delta.modified().contains(&sibling_link));
    assert!(delta.after().values().any(|s| s.entity.id() != sibling_link
        && s.entity.as_multiple_birth().is_some()));
}
