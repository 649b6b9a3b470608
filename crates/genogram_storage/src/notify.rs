//! Change notifications for observers of the graph.
//!
//! The graph queues a [`Change`] for every observable mutation. Hosts drain
//! the queue after each edit and re-read whatever they display.

use genogram_foundation::EntityId;

/// One observable change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// An entity became live.
    Added(EntityId),
    /// An entity was removed.
    Removed(EntityId),
    /// An entity's relationships changed in place.
    Relinked(EntityId),
    /// The resolved value of a property changed.
    Property {
        /// The entity.
        entity: EntityId,
        /// The property name.
        name: String,
    },
    /// A layer was activated or deactivated.
    LayerActivation {
        /// The layer.
        layer: EntityId,
        /// The new state.
        active: bool,
    },
    /// A layer's name, order, or geometry flag changed.
    LayerChanged(EntityId),
    /// The tag registry changed.
    Tags,
    /// The extension property registry changed.
    Extensions,
    /// A proposed entity was committed.
    Committed(EntityId),
    /// A committed entity was marked proposed again.
    Uncommitted(EntityId),
}

impl Change {
    /// Returns the entity this change concerns, if any.
    #[must_use]
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Self::Added(id)
            | Self::Removed(id)
            | Self::Relinked(id)
            | Self::LayerChanged(id)
            | Self::Committed(id)
            | Self::Uncommitted(id) => Some(*id),
            Self::Property { entity, .. } => Some(*entity),
            Self::LayerActivation { layer, .. } => Some(*layer),
            Self::Tags | Self::Extensions => None,
        }
    }
}
