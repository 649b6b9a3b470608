//! Removal cascades and their undo

use genogram_storage::{EntityId, EntityKind, EventKind, Value};

use crate::family;

#[test]
fn removing_a_person_takes_its_dependents() {
    let mut f = family();
    let birth = f.doc.add_event(EventKind::Birth, f.a).unwrap();
    let link = f.doc.graph().person(f.child).unwrap().child_of().unwrap();

    let removed = f.doc.remove(&[f.a]).unwrap();
    for id in [f.a, f.bond, link, f.conflict, birth] {
        assert!(removed.contains(&id), "{id} should be removed");
        assert!(!f.doc.graph().contains(id));
    }
    assert!(f.doc.graph().contains(f.b));
    assert!(f.doc.graph().contains(f.child));
    assert_eq!(f.doc.graph().parents_of(f.child), None);
    f.doc.validate().unwrap();
}

#[test]
fn undoing_a_person_removal_restores_identical_ids() {
    let mut f = family();
    f.doc.set_property(f.bond, "divorced", Value::Bool(true)).unwrap();
    let before = f.doc.graph().clone();

    f.doc.remove(&[f.a]).unwrap();
    assert!(f.doc.undo().unwrap());
    assert_eq!(f.doc.graph(), &before);
    assert_eq!(
        f.doc.property(f.bond, "divorced").unwrap(),
        Value::Bool(true)
    );

    assert!(f.doc.redo().unwrap());
    assert!(!f.doc.graph().contains(f.bond));
}

#[test]
fn undoing_a_pair_bond_removal_relinks_children() {
    let mut f = family();
    f.doc.remove(&[f.bond]).unwrap();
    assert_eq!(f.doc.graph().parents_of(f.child), None);
    assert!(f.doc.graph().person(f.a).unwrap().pair_bonds().is_empty());

    f.doc.undo().unwrap();
    assert_eq!(f.doc.graph().parents_of(f.child), Some(f.bond));
    let link = f.doc.graph().person(f.child).unwrap().child_of().unwrap();
    assert_eq!(f.doc.graph().child_of(link).unwrap().target(), f.bond);
    for partner in [f.a, f.b] {
        let bonds = f.doc.graph().person(partner).unwrap().pair_bonds().clone();
        assert_eq!(bonds.into_iter().collect::<Vec<_>>(), vec![f.bond]);
    }
}

#[test]
fn removing_a_twin_dissolves_the_group() {
    let mut f = family();
    let twin = f.doc.add_person(Some("Cat")).unwrap();
    f.doc.set_parents(twin, Some(f.child)).unwrap();
    let group = f.doc.graph().multiple_birth_of(f.child).unwrap();
    let before = f.doc.graph().clone();

    f.doc.remove(&[twin]).unwrap();
    assert!(!f.doc.graph().contains(group));
    assert_eq!(f.doc.graph().parents_of(f.child), Some(f.bond));
    assert!(f.doc.ids_of(EntityKind::MultipleBirth).is_empty());

    f.doc.undo().unwrap();
    assert_eq!(f.doc.graph(), &before);
}

#[test]
fn removing_a_layer_undoes_with_its_overrides() {
    let mut f = family();
    let layer = f.doc.add_layer("Session").unwrap();
    f.doc.set_layer_active(layer, true).unwrap();
    f.doc.set_property(f.a, "color", "red".into()).unwrap();
    assert_eq!(f.doc.graph().base_value(f.a, "color"), None);

    f.doc.remove(&[layer]).unwrap();
    assert_eq!(f.doc.property(f.a, "color").unwrap(), Value::Nil);
    f.doc.undo().unwrap();
    assert_eq!(f.doc.property(f.a, "color").unwrap(), Value::from("red"));
}

#[test]
fn failed_command_leaves_everything_unchanged() {
    let mut f = family();
    let before = f.doc.graph().clone();
    let depth = f.doc.stack().len();

    assert!(f.doc.add_pair_bond(f.a, f.a).is_err());
    assert!(f.doc.add_event(EventKind::Married, f.a).is_err());
    assert!(f.doc.set_property(f.a, "size", "big".into()).is_err());
    assert!(f.doc.remove(&[f.a, EntityId::new(999)]).is_err());

    assert_eq!(f.doc.graph(), &before);
    assert_eq!(f.doc.stack().len(), depth);
}
