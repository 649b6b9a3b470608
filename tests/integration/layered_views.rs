//! Layered views end to end

use genogram_runtime::{RuntimeConfig, Session};
use genogram_storage::{EntityId, Value};
use tempfile::TempDir;

use crate::{output, repl, script};

#[test]
fn edits_under_an_active_layer_stay_in_the_layer() {
    let mut repl = repl();
    script(
        &mut repl,
        "add person Ann\nset 1 color blue\nadd layer Therapy\nlayer on 2\nset 1 color red\n",
    );
    assert_eq!(output(&mut repl, "get 1 color"), "\"red\"");
    script(&mut repl, "layer off 2\n");
    assert_eq!(output(&mut repl, "get 1 color"), "\"blue\"");
    script(&mut repl, "layer on 2\n");
    assert_eq!(output(&mut repl, "get 1 color"), "\"red\"");

    script(&mut repl, "set 1 name Anna\n");
    let graph = repl.session().document().graph();
    assert_eq!(graph.base_value(EntityId::new(1), "name"), Some(&Value::from("Anna")));
}

#[test]
fn geometry_follows_geometry_layers_only() {
    let mut repl = repl();
    script(
        &mut repl,
        "add person Ann\nadd layer Plain\nlayer on 2\nset 1 item_pos 10,20\n",
    );
    let graph = repl.session().document().graph();
    assert_eq!(
        graph.base_value(EntityId::new(1), "item_pos"),
        Some(&Value::point(10.0, 20.0))
    );

    script(&mut repl, "layer geometry 2 on\nset 1 item_pos 30,40\nlayer off 2\n");
    assert_eq!(output(&mut repl, "get 1 item_pos"), "(10, 20)");
    script(&mut repl, "undo\n");
    assert_eq!(output(&mut repl, "get 1 item_pos"), "(30, 40)");
}

#[test]
fn layer_order_decides_the_winner() {
    let mut repl = repl();
    script(
        &mut repl,
        "\
add person Ann
add layer Low
add layer High
layer on 2
layer on 3
set 1 color green
",
    );
    assert_eq!(output(&mut repl, "get 1 color"), "\"green\"");
    script(&mut repl, "layer off 3\nlayer clear 2\nlayer on 3\n");
    assert_eq!(output(&mut repl, "get 1 color"), "\"green\"");
    script(&mut repl, "layer order 3 2\n");
    assert_eq!(output(&mut repl, "get 1 color"), "\"green\"");
    script(&mut repl, "layer off 3\n");
    assert_eq!(output(&mut repl, "get 1 color"), "nil");
}

#[test]
fn overrides_survive_a_save_and_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("view.gen");
    let mut repl = repl();
    script(
        &mut repl,
        &format!(
            "add person Ann\nadd layer View\nlayer geometry 2 on\nlayer on 2\nset 1 item_pos 5,5\nset 1 color gold\nlayer off 2\nsave {}\n",
            path.display()
        ),
    );

    let mut session = Session::open(&path, RuntimeConfig::batch()).unwrap();
    let ann = EntityId::new(1);
    let layer = EntityId::new(2);
    assert_eq!(session.document().property(ann, "color").unwrap(), Value::Nil);
    session.document_mut().set_layer_active(layer, true).unwrap();
    assert_eq!(
        session.document().property(ann, "color").unwrap(),
        Value::from("gold")
    );
    assert_eq!(
        session.document().property(ann, "item_pos").unwrap(),
        Value::point(5.0, 5.0)
    );
}
