//! Genogram - Family diagram relationship graph
//!
//! This crate re-exports all layers of the genogram engine for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 3: genogram_runtime    - Persistence, sessions, REPL, CLI
//! Layer 2: genogram_history    - Commands, undo/redo, cascades, documents
//! Layer 1: genogram_storage    - Entity graph, properties, layers
//! Layer 0: genogram_foundation - Core types (EntityId, Value, kinds, Error)
//! ```

pub use genogram_foundation as foundation;
pub use genogram_history as history;
pub use genogram_runtime as runtime;
pub use genogram_storage as storage;
