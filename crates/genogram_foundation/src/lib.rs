//! Core identifiers, values, kinds, and errors for the genogram engine.
//!
//! This crate provides:
//! - [`EntityId`] - Stable, never-reused entity identifiers
//! - [`Value`] - The property value type shared by every entity
//! - [`EntityKind`], [`EventKind`], [`RelationshipKind`] - Closed kind sets
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod kind;
pub mod value;

pub use entity::{EntityId, IdAllocator};
pub use error::{Error, ErrorContext, ErrorKind, Result};
pub use kind::{EntityKind, EventKind, RelationshipKind};
pub use value::{Value, ValueType};
