//! Entity graph, layered properties, and structural deltas for the genogram
//! engine.
//!
//! This crate provides:
//! - [`Graph`] - The entity arena with back-reference bookkeeping
//! - [`Entity`] and the [`Relational`] capability shared by every kind
//! - Layered property resolution over base values and [`Layer`] overlays
//! - [`Delta`] - Reversible structural transitions built from snapshots
//! - [`Change`] - Notifications queued for observers of the graph

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod delta;
pub mod entity;
pub mod extension;
pub mod graph;
pub mod layer;
pub mod notify;
pub mod parents;
pub mod property;
pub mod proposal;
pub mod relink;
pub mod schema;
pub mod tags;
pub mod validate;

pub use delta::Delta;
pub use entity::{
    ChildOf, Emotion, Entity, Event, Layer, MultipleBirth, PairBond, Person, Reference, Relational,
};
pub use extension::{RemovedExtension, ReplacedExtensions};
pub use graph::{EntitySnapshot, Graph};
pub use notify::Change;
pub use property::{PropertyRow, PropertyTable};
pub use schema::{ExtensionRegistry, ExtensionSpec, PropertyInfo, PropertySpec};

// Re-export foundation types used throughout the public API
pub use genogram_foundation::{
    EntityId, EntityKind, Error, ErrorKind, EventKind, RelationshipKind, Result, Value, ValueType,
};
