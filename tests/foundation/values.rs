//! Integration tests for Value and `ValueType`

use chrono::NaiveDate;
use genogram_foundation::{EntityId, IdAllocator, Value, ValueType};

// =============================================================================
// Value Construction
// =============================================================================

#[test]
fn default_value_is_nil() {
    assert!(Value::default().is_nil());
}

#[test]
fn conversions() {
    assert_eq!(Value::from(true), Value::Bool(true));
    assert_eq!(Value::from(7_i32), Value::Int(7));
    assert_eq!(Value::from(7_i64), Value::Int(7));
    assert_eq!(Value::from(1.5), Value::Float(1.5));
    assert_eq!(Value::from("a"), Value::String("a".into()));
    assert_eq!(
        Value::from(vec!["a", "b"]),
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
}

#[test]
fn accessors() {
    assert_eq!(Value::Int(3).as_int(), Some(3));
    assert_eq!(Value::Int(3).as_float(), Some(3.0));
    assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
    assert_eq!(Value::Float(2.5).as_int(), None);
    assert_eq!(Value::from("3").as_float(), None);
    assert_eq!(Value::point(1.0, 2.0).as_point(), Some((1.0, 2.0)));
    assert_eq!(Value::from("x").as_str(), Some("x"));
    let dt = NaiveDate::from_ymd_opt(1960, 1, 2)
        .unwrap()
        .and_hms_opt(3, 4, 5)
        .unwrap();
    assert_eq!(Value::from(dt).as_date_time(), Some(dt));
}

#[test]
fn display() {
    assert_eq!(Value::Nil.to_string(), "nil");
    assert_eq!(Value::from("Ann").to_string(), "\"Ann\"");
    assert_eq!(Value::point(1.0, 2.5).to_string(), "(1, 2.5)");
    assert_eq!(
        Value::from(vec![1_i64, 2]).to_string(),
        "[1, 2]"
    );
}

// =============================================================================
// Types
// =============================================================================

#[test]
fn nil_is_accepted_everywhere() {
    for ty in [ValueType::Bool, ValueType::Int, ValueType::Point, ValueType::List] {
        assert!(ty.accepts(&Value::Nil));
    }
}

#[test]
fn types_are_strict() {
    assert!(ValueType::Int.accepts(&Value::Int(1)));
    assert!(!ValueType::Int.accepts(&Value::Float(1.0)));
    assert!(!ValueType::String.accepts(&Value::Bool(false)));
    assert!(ValueType::Any.accepts(&Value::point(0.0, 0.0)));
}

#[test]
fn type_names_round_trip() {
    for name in ["bool", "int", "float", "string", "datetime", "point", "list", "any"] {
        assert_eq!(ValueType::from_name(name).unwrap().name(), name);
    }
    assert_eq!(ValueType::from_name("decimal"), None);
}

// =============================================================================
// Ids
// =============================================================================

#[test]
fn allocator_never_reuses_observed_ids() {
    let mut ids = IdAllocator::new();
    assert_eq!(ids.allocate(), EntityId::new(1));
    ids.observe(EntityId::new(10));
    assert_eq!(ids.allocate(), EntityId::new(11));
    ids.observe(EntityId::new(3));
    assert_eq!(ids.allocate(), EntityId::new(12));
}

#[test]
fn ids_order_by_raw_value() {
    assert!(EntityId::new(2) < EntityId::new(10));
    assert_eq!(EntityId::from(5).raw(), 5);
}
