//! Two-pass reading and what it drops

use genogram_foundation::ErrorKind;
use genogram_runtime::serialize::{Item, Record};
use genogram_runtime::{DiagramData, FORMAT_VERSION, Pruned, read, write};
use genogram_storage::{EntityId, EntityKind};

use crate::sample;

#[test]
fn write_then_read_restores_the_same_graph() {
    let s = sample();
    let data = write(s.doc.graph());
    let (graph, report) = read(&data).unwrap();
    assert!(report.is_clean());
    assert_eq!(&graph, s.doc.graph());
    assert_eq!(graph.proposed_ids(), s.doc.graph().proposed_ids());
    graph.validate().unwrap();
}

#[test]
fn write_is_sorted_by_id() {
    let s = sample();
    let data = write(s.doc.graph());
    let ids: Vec<EntityId> = data.items.iter().map(|r| r.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
    assert_eq!(data.items.len(), s.doc.graph().len());
}

#[test]
fn one_dangling_child_link_is_dropped_alone() {
    let s = sample();
    let mut data = write(s.doc.graph());
    let youngest_link = s
        .doc
        .graph()
        .person(s.youngest)
        .unwrap()
        .child_of()
        .unwrap();
    for record in &mut data.items {
        if record.id == youngest_link {
            record.item = Item::ChildOf {
                person: s.youngest,
                target: EntityId::new(9_999),
            };
        }
    }

    let (graph, report) = read(&data).unwrap();
    assert_eq!(report.pruned_count(), 1);
    assert!(matches!(
        &report.pruned[0],
        Pruned::StaleReference { id, kind: EntityKind::ChildOf, .. } if *id == youngest_link
    ));
    assert_eq!(graph.parents_of(s.youngest), None);
    for twin in s.twins {
        assert_eq!(graph.parents_of(twin), Some(s.bond));
    }
    assert_eq!(graph.person(s.mother).unwrap().pair_bonds().len(), 1);
    assert_eq!(graph.len(), s.doc.graph().len() - 1);
    graph.validate().unwrap();
}

#[test]
fn dropping_a_person_strands_its_relationships() {
    let s = sample();
    let mut data = write(s.doc.graph());
    data.items.retain(|r| r.id != s.mother);

    let (graph, report) = read(&data).unwrap();
    assert!(!graph.contains(s.bond));
    assert!(report.pruned.iter().any(|p| matches!(
        p,
        Pruned::StaleReference { id, .. } if *id == s.bond
    )));
    for twin in s.twins {
        assert_eq!(graph.parents_of(twin), None);
        assert_eq!(graph.multiple_birth_of(twin), None);
    }
    assert!(report.pruned.contains(&Pruned::Override {
        layer: s.layer,
        entity: s.mother
    }));
    graph.validate().unwrap();
}

#[test]
fn newer_versions_are_refused() {
    let data = DiagramData {
        version: FORMAT_VERSION + 1,
        ..DiagramData::default()
    };
    let err = read(&data).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Serialization(_)));
}

#[test]
fn sparse_layer_orders_are_densified() {
    let data = DiagramData {
        version: FORMAT_VERSION,
        items: vec![
            Record {
                id: EntityId::new(1),
                item: Item::Layer {
                    name: "Back".into(),
                    order: 4,
                    active: false,
                    store_geometry: false,
                },
                properties: Default::default(),
            },
            Record {
                id: EntityId::new(2),
                item: Item::Layer {
                    name: "Front".into(),
                    order: 9,
                    active: true,
                    store_geometry: false,
                },
                properties: Default::default(),
            },
        ],
        ..DiagramData::default()
    };
    let (graph, _) = read(&data).unwrap();
    let orders: Vec<u32> = graph.layers().iter().map(|l| l.order()).collect();
    assert_eq!(orders, vec![0, 1]);
    assert_eq!(graph.active_layers()[0].name(), "Front");
}
