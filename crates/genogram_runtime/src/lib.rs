//! Persistence, logging, CLI, and REPL for the genogram engine.
//!
//! This crate provides:
//! - [`serialize`] - The two-pass diagram reader and writer, with pruning
//! - [`format`] - `MessagePack` and JSON encodings, and file I/O
//! - [`Session`] - One open diagram and where it lives on disk
//! - [`Repl`] - Interactive read-eval-print loop over the editing API
//! - [`logging`] - `tracing` subscriber setup

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod config;
pub mod editor;
pub mod format;
pub mod logging;
pub mod repl;
pub mod serialize;
pub mod session;

pub use command::{ParseError, ReplCommand};
pub use config::RuntimeConfig;
pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use format::{Format, from_bytes, load_from_file, save_to_file, to_bytes};
pub use repl::{Repl, ReplError, Reply};
pub use serialize::{DiagramData, FORMAT_VERSION, Pruned, ReadReport, read, write};
pub use session::Session;
