//! Integration tests for Error and `ErrorKind`

use genogram_foundation::{
    EntityId, EntityKind, Error, ErrorContext, ErrorKind, ValueType,
};

#[test]
fn messages() {
    let id = EntityId::new(4);
    assert_eq!(
        Error::entity_not_found(id).to_string(),
        format!("entity not found: {id}")
    );
    assert_eq!(
        Error::not_layered("name").to_string(),
        "property name is not layered"
    );
    assert_eq!(
        Error::type_mismatch("size", ValueType::Int, ValueType::String).to_string(),
        "type mismatch for size: expected int, got string"
    );
}

#[test]
fn invariant_classification() {
    assert!(Error::invariant("bad").is_invariant_violation());
    assert!(!Error::duplicate_id(EntityId::new(1)).is_invariant_violation());
}

#[test]
fn kinds_match() {
    let err = Error::wrong_kind(EntityId::new(2), "person", EntityKind::Layer);
    assert!(matches!(
        err.kind,
        ErrorKind::WrongKind {
            actual: EntityKind::Layer,
            ..
        }
    ));
    let err = Error::cascade_failed(EntityId::new(9));
    assert!(matches!(err.kind, ErrorKind::CascadeFailed(id) if id == EntityId::new(9)));
}

#[test]
fn context_frames_accumulate() {
    let err = Error::invariant("bad")
        .with_context(ErrorContext::new().with_entity(EntityId::new(1)))
        .in_operation("remove")
        .in_operation("compound");
    let context = err.context.unwrap();
    assert_eq!(context.entity, Some(EntityId::new(1)));
    assert_eq!(context.stack, vec!["remove", "compound"]);
}
