//! Integration tests for Layer 2: History
//!
//! Tests for undoable editing through [`Document`]: removal cascades,
//! continuous-edit coalescing, registry edits, and proposals.

mod cascades;
mod coalescing;
mod random_edits;
mod registries;

use genogram_history::{Document, DocumentConfig};
use genogram_storage::{EntityId, RelationshipKind};

/// A couple with one child and a conflict between the partners.
pub struct Family {
    pub doc: Document,
    pub a: EntityId,
    pub b: EntityId,
    pub bond: EntityId,
    pub child: EntityId,
    pub conflict: EntityId,
}

pub fn family() -> Family {
    let mut doc = Document::with_config(DocumentConfig::unbounded());
    let a = doc.add_person(Some("Ann")).unwrap();
    let b = doc.add_person(Some("Bob")).unwrap();
    let bond = doc.add_pair_bond(a, b).unwrap();
    let child = doc.add_person(Some("Cal")).unwrap();
    doc.set_parents(child, Some(bond)).unwrap();
    let conflict = doc
        .add_emotion(RelationshipKind::Conflict, a, Some(b))
        .unwrap();
    Family {
        doc,
        a,
        b,
        bond,
        child,
        conflict,
    }
}
