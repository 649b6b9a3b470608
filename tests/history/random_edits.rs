//! Property-based checks that any edit sequence undoes and redoes exactly

use genogram_history::{Document, DocumentConfig};
use genogram_storage::{
    Entity, EntityId, EntityKind, EventKind, ExtensionSpec, PairBond, Person, RelationshipKind,
    Value, ValueType,
};
use proptest::prelude::*;

const TAGS: [&str; 3] = ["kin", "focus", "triangle"];
const EXTENSIONS: [&str; 3] = ["Anxiety", "Functioning", "Symptom"];

#[derive(Clone, Debug)]
enum Edit {
    AddPerson,
    AddPairBond(usize, usize),
    AddEmotion(usize, usize),
    SetParents(usize, usize),
    ClearParents(usize),
    SetName(usize, String),
    Move(usize, i32),
    AddLayer,
    ToggleLayer(usize),
    ToggleGeometry(usize),
    Remove(usize),
    AddTag(usize),
    RenameTag(usize, usize),
    RemoveTag(usize),
    TagPerson(usize, usize),
    AddExtension(usize),
    RemoveExtension(usize),
    ReplaceExtensions(Vec<usize>),
    AddEvent(usize),
    SetExtension(usize, usize, i64),
    ProposePerson,
    ProposeBond(usize, usize),
    Accept(usize),
    Reject(usize),
}

impl Edit {
    fn touches_proposals(&self) -> bool {
        matches!(
            self,
            Self::ProposePerson | Self::ProposeBond(..) | Self::Accept(_) | Self::Reject(_)
        )
    }
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => Just(Edit::AddPerson),
        2 => (0..8usize, 0..8usize).prop_map(|(a, b)| Edit::AddPairBond(a, b)),
        1 => (0..8usize, 0..8usize).prop_map(|(a, b)| Edit::AddEmotion(a, b)),
        2 => (0..8usize, 0..8usize).prop_map(|(p, t)| Edit::SetParents(p, t)),
        1 => (0..8usize).prop_map(Edit::ClearParents),
        2 => (0..8usize, "[a-z]{1,6}").prop_map(|(p, n)| Edit::SetName(p, n)),
        2 => (0..8usize, -50..50i32).prop_map(|(p, x)| Edit::Move(p, x)),
        1 => Just(Edit::AddLayer),
        1 => (0..4usize).prop_map(Edit::ToggleLayer),
        1 => (0..4usize).prop_map(Edit::ToggleGeometry),
        1 => (0..16usize).prop_map(Edit::Remove),
        1 => (0..3usize).prop_map(Edit::AddTag),
        1 => (0..3usize, 0..3usize).prop_map(|(a, b)| Edit::RenameTag(a, b)),
        1 => (0..3usize).prop_map(Edit::RemoveTag),
        1 => (0..8usize, 0..3usize).prop_map(|(p, t)| Edit::TagPerson(p, t)),
        1 => (0..3usize).prop_map(Edit::AddExtension),
        1 => (0..3usize).prop_map(Edit::RemoveExtension),
        1 => prop::collection::vec(0..3usize, 0..3).prop_map(Edit::ReplaceExtensions),
        1 => (0..8usize).prop_map(Edit::AddEvent),
        1 => (0..8usize, 0..3usize, 0..10i64).prop_map(|(e, x, v)| Edit::SetExtension(e, x, v)),
        1 => Just(Edit::ProposePerson),
        1 => (0..4usize, 0..4usize).prop_map(|(a, b)| Edit::ProposeBond(a, b)),
        1 => (0..4usize).prop_map(Edit::Accept),
        1 => (0..4usize).prop_map(Edit::Reject),
    ]
}

fn attr(index: usize) -> String {
    ExtensionSpec::new(EXTENSIONS[index], ValueType::Int).attr
}

fn pick(ids: &[EntityId], index: usize) -> Option<EntityId> {
    if ids.is_empty() {
        None
    } else {
        Some(ids[index % ids.len()])
    }
}

/// Applies an edit, ignoring the ones the graph refuses.
fn perform(doc: &mut Document, edit: &Edit) {
    let people = doc.ids_of(EntityKind::Person);
    let bonds = doc.ids_of(EntityKind::PairBond);
    let layers = doc.ids_of(EntityKind::Layer);
    let events = doc.ids_of(EntityKind::Event);
    let proposed = doc.graph().proposed_ids();
    let proposed_people: Vec<EntityId> = people
        .iter()
        .copied()
        .filter(|id| doc.graph().is_proposed(*id))
        .collect();
    let _ = match edit {
        Edit::AddPerson => doc.add_person(None).map(|_| ()),
        Edit::AddPairBond(a, b) => match (pick(&people, *a), pick(&people, *b)) {
            (Some(a), Some(b)) => doc.add_pair_bond(a, b).map(|_| ()),
            _ => Ok(()),
        },
        Edit::AddEmotion(a, b) => match (pick(&people, *a), pick(&people, *b)) {
            (Some(a), Some(b)) => doc
                .add_emotion(RelationshipKind::Distance, a, Some(b))
                .map(|_| ()),
            _ => Ok(()),
        },
        Edit::SetParents(p, t) => {
            let targets: Vec<EntityId> = bonds.iter().chain(&people).copied().collect();
            match (pick(&people, *p), pick(&targets, *t)) {
                (Some(p), Some(t)) => doc.set_parents(p, Some(t)),
                _ => Ok(()),
            }
        }
        Edit::ClearParents(p) => match pick(&people, *p) {
            Some(p) => doc.set_parents(p, None),
            None => Ok(()),
        },
        Edit::SetName(p, name) => match pick(&people, *p) {
            Some(p) => doc.set_property(p, "name", name.as_str().into()),
            None => Ok(()),
        },
        Edit::Move(p, x) => match pick(&people, *p) {
            Some(p) => doc.set_property(p, "item_pos", Value::point(f64::from(*x), 0.0)),
            None => Ok(()),
        },
        Edit::AddLayer => doc.add_layer("Layer").map(|_| ()),
        Edit::ToggleLayer(l) => match pick(&layers, *l) {
            Some(l) => {
                let active = doc.graph().layer(l).is_ok_and(|layer| layer.is_active());
                doc.set_layer_active(l, !active)
            }
            None => Ok(()),
        },
        Edit::ToggleGeometry(l) => match pick(&layers, *l) {
            Some(l) => {
                let stores = doc.graph().layer(l).is_ok_and(|layer| layer.stores_geometry());
                doc.set_layer_store_geometry(l, !stores)
            }
            None => Ok(()),
        },
        Edit::AddTag(t) => doc.add_tag(TAGS[*t]).map(|_| ()),
        Edit::RenameTag(a, b) => doc.rename_tag(TAGS[*a], TAGS[*b]),
        Edit::RemoveTag(t) => doc.remove_tag(TAGS[*t]),
        Edit::TagPerson(p, t) => match pick(&people, *p) {
            Some(p) => doc.tag_entity(p, TAGS[*t]),
            None => Ok(()),
        },
        Edit::AddExtension(x) => doc.add_extension(EXTENSIONS[*x], ValueType::Int).map(|_| ()),
        Edit::RemoveExtension(x) => doc.remove_extension(&attr(*x)),
        Edit::ReplaceExtensions(names) => doc.replace_extensions(
            names
                .iter()
                .map(|x| ExtensionSpec::new(EXTENSIONS[*x], ValueType::Int))
                .collect(),
        ),
        Edit::AddEvent(p) => match pick(&people, *p) {
            Some(p) => doc.add_event(EventKind::VariableShift, p).map(|_| ()),
            None => Ok(()),
        },
        Edit::SetExtension(e, x, v) => match pick(&events, *e) {
            Some(e) => doc.set_property(e, &attr(*x), Value::Int(*v)),
            None => Ok(()),
        },
        Edit::ProposePerson => {
            let id = doc.allocate_id();
            doc.propose(Entity::Person(Person::new(id))).map(|_| ())
        }
        Edit::ProposeBond(a, b) => {
            match (pick(&proposed_people, *a), pick(&proposed_people, *b)) {
                (Some(a), Some(b)) => {
                    let id = doc.allocate_id();
                    doc.propose(Entity::PairBond(PairBond::new(id, a, b)))
                        .map(|_| ())
                }
                _ => Ok(()),
            }
        }
        Edit::Accept(i) => match pick(&proposed, *i) {
            Some(id) => doc.accept_proposed(id).map(|_| ()),
            None => Ok(()),
        },
        Edit::Reject(i) => match pick(&proposed, *i) {
            Some(id) => doc.reject_proposed(id).map(|_| ()),
            None => Ok(()),
        },
        Edit::Remove(i) => {
            let all: Vec<EntityId> = doc.graph().iter().map(genogram_storage::Relational::id).collect();
            match pick(&all, *i) {
                Some(id) => doc.remove(&[id]).map(|_| ()),
                None => Ok(()),
            }
        }
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_all_then_redo_all_round_trips(edits in prop::collection::vec(edit(), 0..40)) {
        let mut doc = Document::with_config(DocumentConfig::unbounded());
        let initial = doc.graph().clone();
        for e in &edits {
            perform(&mut doc, e);
            prop_assert!(doc.validate().is_ok(), "invalid after {:?}", e);
        }
        let last = doc.graph().clone();

        while doc.undo().unwrap() {
            prop_assert!(doc.validate().is_ok());
        }
        prop_assert!(!doc.can_undo());
        if !edits.iter().any(Edit::touches_proposals) {
            prop_assert_eq!(doc.graph(), &initial);
        }
        while doc.redo().unwrap() {}
        prop_assert!(!doc.can_redo());
        prop_assert_eq!(doc.graph(), &last);
    }
}
