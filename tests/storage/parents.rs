//! Integration tests for parent assignment and multiple-birth grouping

use genogram_storage::{EntityKind, Graph};

use crate::{Couple, couple, person};

fn with_child(c: &mut Couple) -> genogram_storage::EntityId {
    let kid = person(&mut c.graph);
    c.graph.set_parents(kid, Some(c.bond)).unwrap();
    kid
}

fn count(graph: &Graph, kind: EntityKind) -> usize {
    graph.iter_kind(kind).count()
}

#[test]
fn children_link_to_the_pair_bond() {
    let mut c = couple();
    let one = with_child(&mut c);
    let two = with_child(&mut c);
    assert_eq!(c.graph.children_of(c.bond), vec![one, two]);
    assert_eq!(c.graph.parents_of(one), Some(c.bond));
    assert_eq!(c.graph.multiple_birth_of(one), None);
}

#[test]
fn sibling_target_promotes_into_multiple_birth() {
    let mut c = couple();
    let one = with_child(&mut c);
    let two = person(&mut c.graph);
    c.graph.set_parents(two, Some(one)).unwrap();

    let group = c.graph.multiple_birth_of(one).unwrap();
    assert_eq!(c.graph.multiple_birth_of(two), Some(group));
    assert_eq!(c.graph.multiple_birth(group).unwrap().child_ofs().len(), 2);
    assert_eq!(c.graph.pair_bond(c.bond).unwrap().child_ofs().len(), 0);
    assert_eq!(c.graph.parents_of(two), Some(c.bond));
    c.graph.validate().unwrap();
}

#[test]
fn third_sibling_joins_the_group() {
    let mut c = couple();
    let one = with_child(&mut c);
    let two = person(&mut c.graph);
    c.graph.set_parents(two, Some(one)).unwrap();
    let three = person(&mut c.graph);
    c.graph.set_parents(three, Some(two)).unwrap();

    let group = c.graph.multiple_birth_of(one).unwrap();
    assert_eq!(c.graph.multiple_birth(group).unwrap().child_ofs().len(), 3);
    assert_eq!(count(&c.graph, EntityKind::MultipleBirth), 1);
}

#[test]
fn group_of_one_dissolves_back_to_the_pair_bond() {
    let mut c = couple();
    let one = with_child(&mut c);
    let two = person(&mut c.graph);
    c.graph.set_parents(two, Some(one)).unwrap();
    let group = c.graph.multiple_birth_of(one).unwrap();

    let delta = c.graph.set_parents(two, None).unwrap();
    assert!(delta.removed().contains(&group));
    assert!(!c.graph.contains(group));
    assert_eq!(c.graph.multiple_birth_of(one), None);
    assert_eq!(c.graph.parents_of(one), Some(c.bond));
    assert_eq!(c.graph.parents_of(two), None);
    c.graph.validate().unwrap();
}

#[test]
fn regrouping_reverts_as_one_step() {
    let mut c = couple();
    let one = with_child(&mut c);
    let two = with_child(&mut c);
    let before = c.graph.clone();

    let delta = c.graph.set_parents(two, Some(one)).unwrap();
    assert_eq!(delta.added().len(), 1);
    c.graph.revert_delta(&delta).unwrap();
    assert_eq!(c.graph, before);
}

#[test]
fn same_parents_is_a_no_op() {
    let mut c = couple();
    let kid = with_child(&mut c);
    let delta = c.graph.set_parents(kid, Some(c.bond)).unwrap();
    assert!(delta.is_empty());
}

#[test]
fn sibling_without_parents_is_refused() {
    let mut c = couple();
    let loner = person(&mut c.graph);
    let kid = person(&mut c.graph);
    assert!(c.graph.set_parents(kid, Some(loner)).is_err());
    assert!(c.graph.set_parents(kid, Some(kid)).is_err());
    assert!(c.graph.set_parents(kid, Some(c.a)).is_err());
    assert_eq!(c.graph.parents_of(kid), None);
}
