//! Saving and reopening through the REPL

use genogram_runtime::{Format, load_from_file, save_to_file, serialize::Item};
use genogram_storage::EntityId;
use tempfile::TempDir;

use crate::{output, repl, script};

#[test]
fn save_then_open_in_a_fresh_repl() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kin.json");
    let mut first = repl();
    script(
        &mut first,
        "add person \"Mae West\"\nadd person Abe\nadd bond 1 2\nset 3 divorced true\n",
    );
    script(&mut first, &format!("save {}\n", path.display()));
    assert!(!first.session().is_modified());

    let mut second = repl();
    assert_eq!(
        output(&mut second, &format!("open {}", path.display())),
        format!("Opened {}", path.display())
    );
    assert_eq!(output(&mut second, "get 1 name"), "\"Mae West\"");
    assert_eq!(output(&mut second, "get 3 divorced"), "true");
    assert_eq!(output(&mut second, "undo"), "Nothing to undo");
    assert_eq!(
        second.session().document().graph(),
        first.session().document().graph()
    );
}

#[test]
fn opening_a_damaged_file_reports_repairs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kin.gen");
    let mut first = repl();
    script(
        &mut first,
        "add person A\nadd person B\nadd bond 1 2\nadd person C\nparents 4 3\nadd person D\nparents 6 3\n",
    );
    script(&mut first, &format!("save {}\n", path.display()));

    let mut data = load_from_file(&path).unwrap();
    for record in &mut data.items {
        if let Item::ChildOf { person, target } = &mut record.item {
            if *person == EntityId::new(6) {
                *target = EntityId::new(404);
            }
        }
    }
    save_to_file(&data, &path, Format::MessagePack).unwrap();

    let mut second = repl();
    let opened = output(&mut second, &format!("open {}", path.display()));
    assert!(opened.ends_with("(pruned 1, dissolved 0)"), "{opened}");
    let graph = second.session().document().graph();
    assert_eq!(graph.parents_of(EntityId::new(4)), Some(EntityId::new(3)));
    assert_eq!(graph.parents_of(EntityId::new(6)), None);
    assert_eq!(second.session().report().pruned_count(), 1);
    assert_eq!(output(&mut second, "validate"), "ok");
}

#[test]
fn save_without_a_path_is_refused() {
    let mut repl = repl();
    script(&mut repl, "add person A\n");
    assert!(repl.eval("save").is_err());
    assert!(repl.session().is_modified());
}
