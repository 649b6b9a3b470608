//! The undoable command abstraction.

use std::any::Any;
use std::fmt;

use genogram_foundation::Result;
use genogram_storage::Graph;

/// Coalescing id shared by commands that should merge into one undo step.
///
/// Handed out by [`UndoStack::next_id`](crate::UndoStack::next_id); a drag
/// takes one id and tags every intermediate command with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Upcast to [`Any`] so commands can inspect each other when merging.
pub trait AsAny {
    /// Returns `self` as [`Any`].
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A reversible edit of a [`Graph`].
///
/// `apply` runs once when the command is pushed and again on every redo;
/// `revert` runs on undo. A command captures whatever it needs to revert the
/// first time it applies, so both directions replay exactly. The stack wraps
/// each call in [`Graph::atomically`], so a failing command may leave its own
/// bookkeeping half-written but never the graph.
pub trait Command: AsAny + fmt::Debug {
    /// Text shown next to undo and redo.
    fn label(&self) -> String;

    /// Coalescing id, if this command may merge into its predecessor.
    fn id(&self) -> Option<CommandId> {
        None
    }

    /// Performs the edit.
    ///
    /// # Errors
    ///
    /// Returns the first graph error; the stack restores the graph.
    fn apply(&mut self, graph: &mut Graph) -> Result<()>;

    /// Undoes the edit.
    ///
    /// # Errors
    ///
    /// Returns the first graph error; the stack restores the graph.
    fn revert(&mut self, graph: &mut Graph) -> Result<()>;

    /// Absorbs `other`, which has already been applied, into `self`.
    ///
    /// Returns false if the two cannot merge. Called only when both commands
    /// share an id.
    fn merge_with(&mut self, other: &dyn Command) -> bool {
        let _ = other;
        false
    }
}
