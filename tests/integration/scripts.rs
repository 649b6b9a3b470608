//! REPL scripts over a whole family

use genogram_runtime::{ReplError, Reply};
use genogram_storage::{EntityId, EntityKind, Value};

use crate::{output, repl, script};

const FAMILY: &str = "\
; two parents, twins, and a conflict
add person Mae
add person Abe
add bond 1 2
add event married 3
add person Tia
add person Tom
parents 5 3
parents 6 5
add emotion conflict 1 2
";

fn id(raw: u64) -> EntityId {
    EntityId::new(raw)
}

#[test]
fn script_builds_a_valid_family() {
    let mut repl = repl();
    script(&mut repl, FAMILY);
    let graph = repl.session().document().graph();
    assert_eq!(graph.people().len(), 4);
    let group = graph.multiple_birth_of(id(5)).unwrap();
    assert_eq!(graph.multiple_birth_of(id(6)), Some(group));
    assert_eq!(graph.children_of(id(3)), vec![id(5), id(6)]);
    assert_eq!(output(&mut repl, "validate"), "ok");
}

#[test]
fn failing_line_is_reported_with_its_number() {
    let mut repl = repl();
    let err = repl
        .run_script("add person A\nadd bond 1 1\nadd person B\n".as_bytes())
        .unwrap_err();
    assert_eq!(err.0, 2);
    assert!(matches!(err.1, ReplError::Engine(_)));
    assert_eq!(repl.session().document().graph().len(), 1);

    let err = repl.run_script("frobnicate\n".as_bytes()).unwrap_err();
    assert!(matches!(err.1, ReplError::Parse(_)));
}

#[test]
fn removing_a_parent_then_undoing() {
    let mut repl = repl();
    script(&mut repl, FAMILY);
    let before = repl.session().document().graph().clone();

    let removed = output(&mut repl, "remove 1");
    assert_eq!(removed, "Removed #1 #3 #4 #7 #8 #9 #10");
    let graph = repl.session().document().graph();
    assert!(graph.iter_kind(EntityKind::MultipleBirth).next().is_none());
    assert_eq!(graph.parents_of(id(5)), None);

    assert_eq!(output(&mut repl, "undo"), "Undid: Remove item");
    assert_eq!(repl.session().document().graph(), &before);
    assert_eq!(output(&mut repl, "redo"), "Redid: Remove item");
}

#[test]
fn history_marks_the_cursor() {
    let mut repl = repl();
    script(&mut repl, "add person A\nadd person B\nundo\n");
    assert_eq!(output(&mut repl, "history"), "> 1. Add person\n  2. Add person");
}

#[test]
fn proposals_through_the_repl() {
    let mut repl = repl();
    script(&mut repl, FAMILY);
    let depth = repl.session().document().stack().len();

    assert_eq!(output(&mut repl, "propose person"), "Added proposed person #11");
    assert_eq!(
        output(&mut repl, "propose bond 11 2"),
        "Added proposed pair-bond #12"
    );
    assert!(output(&mut repl, "show 12").contains("(proposed)"));
    assert_eq!(output(&mut repl, "reject 11"), "Rejected #11 #12");
    assert_eq!(repl.session().document().stack().len(), depth);

    output(&mut repl, "propose person");
    assert_eq!(output(&mut repl, "accept 13"), "Accepted #13");
    assert_eq!(output(&mut repl, "undo"), "Undid: Accept proposal");
    assert!(repl.session().document().graph().is_proposed(id(13)));
}

#[test]
fn quit_stops_a_script() {
    let mut repl = repl();
    script(&mut repl, "add person A\nquit\nadd person B\n");
    assert_eq!(repl.session().document().graph().len(), 1);
    assert_eq!(repl.eval("quit").unwrap(), Reply::Quit);
}

#[test]
fn replacing_event_properties_and_undoing() {
    let mut repl = repl();
    script(&mut repl, FAMILY);
    script(&mut repl, "ext add Anxiety int\nset 4 x_anxiety 3\n");

    assert_eq!(
        output(&mut repl, "ext replace Mood string Stress int"),
        "Replaced event properties (2)"
    );
    let doc = repl.session().document();
    let attrs: Vec<&str> = doc
        .graph()
        .extensions()
        .iter()
        .map(|spec| spec.attr.as_str())
        .collect();
    assert_eq!(attrs, vec!["x_mood", "x_stress"]);
    assert!(repl.eval("get 4 x_anxiety").is_err());

    assert_eq!(output(&mut repl, "undo"), "Undid: Replace event properties");
    let doc = repl.session().document();
    assert_eq!(doc.property(id(4), "x_anxiety").unwrap(), Value::Int(3));
}
