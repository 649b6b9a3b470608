//! Undoable editing for the genogram engine.
//!
//! This crate provides:
//! - [`Command`] - The reversible edit abstraction, with coalescing
//! - [`UndoStack`] - Ordered history with a cursor, limit, and clean state
//! - [`cascade`] - Mapping a removal to every entity it takes with it
//! - [`commands`] - The built-in commands
//! - [`Document`] - One graph, its history, and its configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cascade;
pub mod command;
pub mod commands;
pub mod config;
pub mod document;
pub mod stack;

pub use cascade::{Scope, map_removal};
pub use command::{AsAny, Command, CommandId};
pub use config::{DEFAULT_UNDO_LIMIT, DocumentConfig};
pub use document::Document;
pub use stack::UndoStack;
