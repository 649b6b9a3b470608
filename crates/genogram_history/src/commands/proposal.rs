//! Accepting proposed entities.

use std::collections::BTreeSet;

use genogram_foundation::{EntityId, Result};
use genogram_storage::Graph;

use crate::command::Command;

/// Commits a closed set of proposed entities. Undo marks them proposed again.
#[derive(Debug)]
pub struct AcceptProposal {
    ids: BTreeSet<EntityId>,
}

impl AcceptProposal {
    /// Commits `ids`, typically a [`Graph::proposal_closure`].
    #[must_use]
    pub fn new(ids: BTreeSet<EntityId>) -> Self {
        Self { ids }
    }

    /// The ids this command commits.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<EntityId> {
        &self.ids
    }
}

impl Command for AcceptProposal {
    fn label(&self) -> String {
        match self.ids.len() {
            1 => "Accept proposal".to_string(),
            n => format!("Accept {n} proposals"),
        }
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        graph.commit_proposed(&self.ids)
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        graph.mark_proposed(&self.ids)
    }
}
