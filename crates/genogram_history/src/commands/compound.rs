//! Several commands as one undo step.

use genogram_foundation::Result;
use genogram_storage::Graph;
use tracing::trace;

use crate::command::Command;

/// Runs its children in order; undo reverts them in reverse.
///
/// If a child fails the whole compound fails, and the stack restores the
/// graph to where it was before the first child ran.
#[derive(Debug)]
pub struct Compound {
    label: String,
    commands: Vec<Box<dyn Command>>,
}

impl Compound {
    /// Creates an empty compound.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Appends a child.
    #[must_use]
    pub fn with(mut self, command: Box<dyn Command>) -> Self {
        self.commands.push(command);
        self
    }

    /// Appends a child.
    pub fn push(&mut self, command: Box<dyn Command>) {
        self.commands.push(command);
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Command for Compound {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        for command in &mut self.commands {
            trace!(label = %command.label(), "applying child");
            command.apply(graph)?;
        }
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        for command in self.commands.iter_mut().rev() {
            trace!(label = %command.label(), "reverting child");
            command.revert(graph)?;
        }
        Ok(())
    }
}
