//! Integration tests for entity, event, and relationship kinds

use genogram_foundation::{EntityKind, EventKind, RelationshipKind};

#[test]
fn restore_rank_orders_dependencies_first() {
    assert!(EntityKind::Person.rank() < EntityKind::PairBond.rank());
    assert!(EntityKind::PairBond.rank() < EntityKind::MultipleBirth.rank());
    assert!(EntityKind::MultipleBirth.rank() < EntityKind::ChildOf.rank());
    assert!(EntityKind::ChildOf.rank() < EntityKind::Event.rank());
    assert_eq!(EntityKind::Layer.rank(), EntityKind::Person.rank());
}

#[test]
fn event_slugs_round_trip() {
    for kind in EventKind::ALL {
        assert_eq!(EventKind::from_slug(kind.slug()), Some(kind));
    }
    assert_eq!(EventKind::from_slug("wedding"), None);
}

#[test]
fn built_in_events() {
    assert!(EventKind::Birth.is_built_in());
    assert!(EventKind::Married.is_built_in());
    assert!(!EventKind::Moved.is_built_in());
    assert!(!EventKind::VariableShift.is_built_in());
}

#[test]
fn event_owners() {
    assert_eq!(EventKind::Death.parent_kinds(), &[EntityKind::Person]);
    assert_eq!(EventKind::Divorced.parent_kinds(), &[EntityKind::PairBond]);
    assert!(EventKind::VariableShift
        .parent_kinds()
        .contains(&EntityKind::Emotion));
}

#[test]
fn relationship_arity() {
    assert!(RelationshipKind::Cutoff.is_monadic());
    assert!(!RelationshipKind::Conflict.is_monadic());
    for kind in RelationshipKind::ALL {
        assert_eq!(RelationshipKind::from_slug(kind.slug()), Some(kind));
    }
}

#[test]
fn kind_names() {
    assert_eq!(EntityKind::PairBond.to_string(), "pair_bond");
    assert_eq!(EntityKind::ALL.len(), 7);
}
