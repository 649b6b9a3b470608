//! Integration tests for Layer 1: Storage
//!
//! Tests for the entity graph, layered properties, parent grouping, and
//! structural deltas.

mod deltas;
mod graph;
mod parents;

use genogram_storage::{Entity, EntityId, Graph, PairBond, Person};

/// Two partners and their pair-bond.
pub struct Couple {
    pub graph: Graph,
    pub a: EntityId,
    pub b: EntityId,
    pub bond: EntityId,
}

pub fn person(graph: &mut Graph) -> EntityId {
    let id = graph.allocate_id();
    graph.insert(Entity::Person(Person::new(id))).unwrap();
    id
}

pub fn couple() -> Couple {
    let mut graph = Graph::new();
    let a = person(&mut graph);
    let b = person(&mut graph);
    let bond = graph.allocate_id();
    graph
        .insert(Entity::PairBond(PairBond::new(bond, a, b)))
        .unwrap();
    Couple { graph, a, b, bond }
}
