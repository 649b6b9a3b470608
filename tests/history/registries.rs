//! Tag and event-property registry edits

use genogram_storage::{EventKind, ExtensionSpec, Value, ValueType};

use crate::family;

#[test]
fn tag_rename_is_one_step() {
    let mut f = family();
    f.doc.add_tag("risk").unwrap();
    f.doc.tag_entity(f.a, "risk").unwrap();
    f.doc.tag_entity(f.b, "risk").unwrap();
    let depth = f.doc.stack().len();

    f.doc.rename_tag("risk", "watch").unwrap();
    assert_eq!(f.doc.stack().len(), depth + 1);
    assert_eq!(f.doc.graph().find_by_tag("watch"), vec![f.a, f.b]);
    assert!(f.doc.graph().find_by_tag("risk").is_empty());

    f.doc.undo().unwrap();
    assert!(f.doc.graph().tags().contains("risk"));
    assert!(!f.doc.graph().tags().contains("watch"));
    assert_eq!(f.doc.graph().entity_tags(f.a), vec!["risk".to_string()]);
}

#[test]
fn removing_a_tag_strips_it_everywhere() {
    let mut f = family();
    for tag in ["one", "two"] {
        f.doc.add_tag(tag).unwrap();
        f.doc.tag_entity(f.a, tag).unwrap();
    }
    f.doc.remove_tag("one").unwrap();
    assert_eq!(f.doc.graph().entity_tags(f.a), vec!["two".to_string()]);
    f.doc.undo().unwrap();
    assert_eq!(f.doc.graph().entity_tags(f.a).len(), 2);
}

#[test]
fn tagging_needs_a_registered_tag() {
    let mut f = family();
    assert!(f.doc.tag_entity(f.a, "nope").is_err());
    assert!(f.doc.add_tag("  ").is_err());
    f.doc.add_tag("x").unwrap();
    assert!(!f.doc.add_tag("x").unwrap());
}

#[test]
fn extension_removal_undo_restores_values() {
    let mut f = family();
    let attr = f.doc.add_extension("Anxiety Level", ValueType::Int).unwrap();
    assert_eq!(attr, "x_anxiety_level");
    let shift = f.doc.add_event(EventKind::VariableShift, f.a).unwrap();
    let other = f.doc.add_event(EventKind::VariableShift, f.bond).unwrap();
    f.doc.set_property(shift, &attr, Value::Int(3)).unwrap();
    f.doc.set_property(other, &attr, Value::Int(7)).unwrap();

    f.doc.remove_extension(&attr).unwrap();
    assert!(f.doc.property(shift, &attr).is_err());

    f.doc.undo().unwrap();
    assert_eq!(f.doc.property(shift, &attr).unwrap(), Value::Int(3));
    assert_eq!(f.doc.property(other, &attr).unwrap(), Value::Int(7));
}

#[test]
fn extension_rename_moves_values() {
    let mut f = family();
    let attr = f.doc.add_extension("Mood", ValueType::String).unwrap();
    let shift = f.doc.add_event(EventKind::VariableShift, f.a).unwrap();
    f.doc.set_property(shift, &attr, "calm".into()).unwrap();

    let renamed = f.doc.rename_extension(&attr, "Affect").unwrap();
    assert_eq!(renamed, "x_affect");
    assert_eq!(f.doc.property(shift, &renamed).unwrap(), Value::from("calm"));
    f.doc.undo().unwrap();
    assert_eq!(f.doc.property(shift, &attr).unwrap(), Value::from("calm"));
}

#[test]
fn extension_values_are_type_checked() {
    let mut f = family();
    let attr = f.doc.add_extension("Score", ValueType::Int).unwrap();
    let shift = f.doc.add_event(EventKind::VariableShift, f.a).unwrap();
    assert!(f.doc.set_property(shift, &attr, "high".into()).is_err());
}

#[test]
fn replacing_extensions_is_one_undoable_step() {
    let mut f = family();
    let anxiety = f.doc.add_extension("Anxiety", ValueType::Int).unwrap();
    let mood = f.doc.add_extension("Mood", ValueType::String).unwrap();
    let shift = f.doc.add_event(EventKind::VariableShift, f.a).unwrap();
    f.doc.set_property(shift, &anxiety, Value::Int(6)).unwrap();
    f.doc.set_property(shift, &mood, "tense".into()).unwrap();
    let depth = f.doc.stack().len();
    let before = f.doc.graph().clone();

    f.doc
        .replace_extensions(vec![
            ExtensionSpec::new("Anxiety", ValueType::Int),
            ExtensionSpec::new("Symptom", ValueType::Bool),
        ])
        .unwrap();
    assert_eq!(f.doc.stack().len(), depth + 1);
    assert_eq!(
        f.doc.stack().undo_label().as_deref(),
        Some("Replace event properties")
    );
    assert_eq!(f.doc.property(shift, &anxiety).unwrap(), Value::Nil);
    assert!(f.doc.property(shift, &mood).is_err());
    f.doc.set_property(shift, "x_symptom", Value::Bool(true)).unwrap();

    f.doc.undo().unwrap();
    f.doc.undo().unwrap();
    assert_eq!(f.doc.graph(), &before);
    assert_eq!(f.doc.property(shift, &mood).unwrap(), Value::from("tense"));
}

#[test]
fn replacing_with_clashing_keys_is_refused() {
    let mut f = family();
    f.doc.add_extension("Anxiety", ValueType::Int).unwrap();
    let depth = f.doc.stack().len();
    let before = f.doc.graph().clone();
    let clash = vec![
        ExtensionSpec::new("Mood", ValueType::Int),
        ExtensionSpec::new("MOOD", ValueType::Int),
    ];
    assert!(f.doc.replace_extensions(clash).is_err());
    assert_eq!(f.doc.graph(), &before);
    assert_eq!(f.doc.stack().len(), depth);
}
