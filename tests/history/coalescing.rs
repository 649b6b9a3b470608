//! Continuous edits, labels, and the history limit

use genogram_history::{Document, DocumentConfig};
use genogram_storage::Value;

#[test]
fn drag_undoes_in_one_step() {
    let mut doc = Document::with_config(DocumentConfig::unbounded());
    let p = doc.add_person(None).unwrap();
    let before = doc.graph().clone();
    let depth = doc.stack().len();

    let drag = doc.begin_drag();
    for x in [10.0, 20.0, 30.0] {
        doc.drag_property(drag, p, "item_pos", Value::point(x, 5.0))
            .unwrap();
    }
    assert_eq!(doc.stack().len(), depth + 1);
    assert_eq!(doc.property(p, "item_pos").unwrap(), Value::point(30.0, 5.0));

    doc.undo().unwrap();
    assert_eq!(doc.graph(), &before);
    doc.redo().unwrap();
    assert_eq!(doc.property(p, "item_pos").unwrap(), Value::point(30.0, 5.0));
}

#[test]
fn separate_drags_stay_separate() {
    let mut doc = Document::new();
    let p = doc.add_person(None).unwrap();
    for x in [1.0, 2.0] {
        let drag = doc.begin_drag();
        doc.drag_property(drag, p, "item_pos", Value::point(x, x))
            .unwrap();
    }
    doc.undo().unwrap();
    assert_eq!(doc.property(p, "item_pos").unwrap(), Value::point(1.0, 1.0));
}

#[test]
fn labels_track_the_cursor() {
    let mut doc = Document::new();
    let a = doc.add_person(None).unwrap();
    let b = doc.add_person(None).unwrap();
    doc.add_pair_bond(a, b).unwrap();
    assert_eq!(doc.stack().undo_label().as_deref(), Some("Add pair-bond"));

    doc.undo().unwrap();
    assert_eq!(doc.stack().undo_label().as_deref(), Some("Add person"));
    assert_eq!(doc.stack().redo_label().as_deref(), Some("Add pair-bond"));

    doc.set_property(a, "name", "Ann".into()).unwrap();
    assert!(!doc.can_redo());
    assert_eq!(doc.stack().labels().last().map(String::as_str), Some("Set name"));
}

#[test]
fn history_limit_drops_oldest_steps() {
    let mut doc = Document::with_config(DocumentConfig::default().with_undo_limit(Some(2)));
    let p = doc.add_person(None).unwrap();
    for name in ["a", "b", "c"] {
        doc.set_property(p, "name", name.into()).unwrap();
    }
    assert_eq!(doc.stack().len(), 2);
    while doc.undo().unwrap() {}
    assert_eq!(doc.property(p, "name").unwrap(), Value::from("a"));
    assert!(doc.graph().contains(p));
}

#[test]
fn saved_state_follows_undo() {
    let mut doc = Document::new();
    assert!(!doc.is_modified());
    doc.add_person(None).unwrap();
    assert!(doc.is_modified());
    doc.mark_saved();
    assert!(!doc.is_modified());
    doc.undo().unwrap();
    assert!(doc.is_modified());
    doc.redo().unwrap();
    assert!(!doc.is_modified());
}
