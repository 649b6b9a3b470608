//! The undo stack.
//!
//! An ordered list of applied commands and a cursor. Everything before the
//! cursor has been applied; everything from the cursor on has been undone
//! and can be redone. Pushing discards the redo tail.

use genogram_foundation::Result;
use genogram_storage::Graph;
use tracing::{debug, warn};

use crate::command::{Command, CommandId};

/// Undo history of one document.
#[derive(Debug, Default)]
pub struct UndoStack {
    commands: Vec<Box<dyn Command>>,
    cursor: usize,
    limit: Option<usize>,
    clean: Option<usize>,
    next_id: u64,
}

impl UndoStack {
    /// Creates an unbounded stack whose empty state is clean.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clean: Some(0),
            ..Self::default()
        }
    }

    /// Creates a stack that keeps at most `limit` commands.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            limit,
            ..Self::new()
        }
    }

    /// The configured command limit.
    #[must_use]
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Changes the limit, pruning the oldest commands if needed.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        self.enforce_limit();
    }

    /// Hands out a fresh coalescing id.
    pub fn next_id(&mut self) -> CommandId {
        self.next_id += 1;
        CommandId::new(self.next_id)
    }

    /// Number of commands held, applied or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if no command is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of commands currently applied.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns true if there is a command to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// Returns true if there is a command to redo.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Label of the command `undo` would revert.
    #[must_use]
    pub fn undo_label(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(|c| c.label())
    }

    /// Label of the command `redo` would apply.
    #[must_use]
    pub fn redo_label(&self) -> Option<String> {
        self.commands.get(self.cursor).map(|c| c.label())
    }

    /// Labels of every held command, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.label()).collect()
    }

    /// Marks the current state as saved.
    pub fn set_clean(&mut self) {
        self.clean = Some(self.cursor);
    }

    /// Returns true if the current state is the saved one.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.clean == Some(self.cursor)
    }

    /// Drops all history and marks the current state clean.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.cursor = 0;
        self.clean = Some(0);
    }

    /// Applies `command` and records it.
    ///
    /// A command sharing its id with the top of the stack is offered to the
    /// top's `merge_with`; if accepted it is dropped after applying.
    ///
    /// # Errors
    ///
    /// Returns the command's error. The stack and the graph are unchanged.
    pub fn push(&mut self, graph: &mut Graph, mut command: Box<dyn Command>) -> Result<()> {
        graph.atomically(|g| command.apply(g))?;

        if self.cursor < self.commands.len() {
            self.commands.truncate(self.cursor);
            if self.clean.is_some_and(|clean| clean > self.cursor) {
                self.clean = None;
            }
        }

        if let (Some(id), Some(top)) = (command.id(), self.commands.last_mut()) {
            if top.id() == Some(id) && top.merge_with(command.as_ref()) {
                debug!(label = %top.label(), %id, "merged command");
                if self.clean == Some(self.cursor) {
                    self.clean = None;
                }
                return Ok(());
            }
        }

        debug!(label = %command.label(), "pushed command");
        self.commands.push(command);
        self.cursor += 1;
        self.enforce_limit();
        Ok(())
    }

    /// Reverts the command before the cursor.
    ///
    /// Returns `Ok(false)` if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns the command's error. The stack and the graph are unchanged.
    pub fn undo(&mut self, graph: &mut Graph) -> Result<bool> {
        let Some(index) = self.cursor.checked_sub(1) else {
            return Ok(false);
        };
        let command = &mut self.commands[index];
        graph.atomically(|g| command.revert(g))?;
        debug!(label = %command.label(), "undid command");
        self.cursor = index;
        Ok(true)
    }

    /// Re-applies the command at the cursor.
    ///
    /// Returns `Ok(false)` if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns the command's error. The stack and the graph are unchanged.
    pub fn redo(&mut self, graph: &mut Graph) -> Result<bool> {
        let Some(command) = self.commands.get_mut(self.cursor) else {
            return Ok(false);
        };
        graph.atomically(|g| command.apply(g))?;
        debug!(label = %command.label(), "redid command");
        self.cursor += 1;
        Ok(true)
    }

    /// Drops commands that no longer replay against `graph`.
    ///
    /// For use after `graph` changed outside the stack. Applied commands are
    /// reverted newest first on a scratch copy and the redo tail is applied
    /// oldest first; each command that fails, or leaves the copy invalid, is
    /// dropped. If the survivors do not lead back to `graph`, all history is
    /// dropped. Returns the number of commands dropped.
    pub fn retain_replayable(&mut self, graph: &Graph) -> usize {
        let held = self.commands.len();
        let mut keep = vec![true; held];
        let mut scratch = graph.clone();
        let (applied, undone) = self.commands.split_at_mut(self.cursor);
        let (keep_applied, keep_undone) = keep.split_at_mut(self.cursor);

        for (command, kept) in applied.iter_mut().zip(keep_applied.iter_mut()).rev() {
            *kept = scratch
                .atomically(|g| {
                    command.revert(g)?;
                    g.validate()
                })
                .is_ok();
        }
        let mut consistent = applied
            .iter_mut()
            .zip(keep_applied.iter())
            .filter(|(_, kept)| **kept)
            .all(|(command, _)| scratch.atomically(|g| command.apply(g)).is_ok())
            && scratch == *graph;

        if consistent {
            for (command, kept) in undone.iter_mut().zip(keep_undone.iter_mut()) {
                *kept = scratch
                    .atomically(|g| {
                        command.apply(g)?;
                        g.validate()
                    })
                    .is_ok();
            }
            consistent = undone
                .iter_mut()
                .zip(keep_undone.iter())
                .rev()
                .filter(|(_, kept)| **kept)
                .all(|(command, _)| scratch.atomically(|g| command.revert(g)).is_ok())
                && scratch == *graph;
        }

        if !consistent {
            warn!(dropped = held, "history no longer replays; clearing it");
            self.commands.clear();
            self.cursor = 0;
            self.clean = None;
            return held;
        }

        let dropped = keep.iter().filter(|kept| !**kept).count();
        if dropped == 0 {
            return 0;
        }
        let cursor = keep[..self.cursor].iter().filter(|kept| **kept).count();
        let mut flags = keep.into_iter();
        self.commands.retain(|_| flags.next().unwrap_or(false));
        self.cursor = cursor;
        self.clean = None;
        debug!(dropped, "dropped commands that no longer replay");
        dropped
    }

    fn enforce_limit(&mut self) {
        let Some(limit) = self.limit else {
            return;
        };
        if self.commands.len() <= limit {
            return;
        }
        let excess = self.commands.len() - limit;
        let excess = excess.min(self.cursor);
        self.commands.drain(..excess);
        self.cursor -= excess;
        self.clean = self.clean.and_then(|clean| clean.checked_sub(excess));
        debug!(pruned = excess, "pruned undo history");
    }
}
