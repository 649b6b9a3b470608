//! Error types for the genogram engine.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::EntityId;
use crate::kind::EntityKind;
use crate::value::ValueType;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for genogram operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Adds an operation frame, creating the context if needed.
    #[must_use]
    pub fn in_operation(mut self, operation: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        self.context = Some(context.with_frame(operation));
        self
    }

    /// Creates an entity not found error.
    #[must_use]
    pub fn entity_not_found(id: EntityId) -> Self {
        Self::new(ErrorKind::EntityNotFound(id))
    }

    /// Creates a wrong kind error.
    #[must_use]
    pub fn wrong_kind(entity: EntityId, expected: impl Into<String>, actual: EntityKind) -> Self {
        Self::new(ErrorKind::WrongKind {
            entity,
            expected: expected.into(),
            actual,
        })
    }

    /// Creates an invariant violation error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvariantViolation(message.into()))
    }

    /// Creates an unknown property error.
    #[must_use]
    pub fn unknown_property(kind: EntityKind, name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownProperty {
            kind,
            name: name.into(),
        })
    }

    /// Creates a property type mismatch error.
    #[must_use]
    pub fn type_mismatch(property: impl Into<String>, expected: ValueType, actual: ValueType) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            property: property.into(),
            expected,
            actual,
        })
    }

    /// Creates a not layered error.
    #[must_use]
    pub fn not_layered(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotLayered(name.into()))
    }

    /// Creates a stale reference error.
    #[must_use]
    pub fn stale_reference(from: EntityId, to: EntityId) -> Self {
        Self::new(ErrorKind::StaleReference { from, to })
    }

    /// Creates a cascade failure error.
    #[must_use]
    pub fn cascade_failed(id: EntityId) -> Self {
        Self::new(ErrorKind::CascadeFailed(id))
    }

    /// Creates a duplicate id error.
    #[must_use]
    pub fn duplicate_id(id: EntityId) -> Self {
        Self::new(ErrorKind::DuplicateId(id))
    }

    /// Returns true if this error is an invariant violation.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.kind, ErrorKind::InvariantViolation(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Entity is not live in the graph.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity exists but is not of an acceptable kind.
    #[error("{entity} is a {actual}, expected {expected}")]
    WrongKind {
        /// The offending entity.
        entity: EntityId,
        /// Description of the acceptable kinds.
        expected: String,
        /// The kind that was found.
        actual: EntityKind,
    },

    /// A structural invariant would be broken; nothing was applied.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Property is not declared for this entity kind.
    #[error("unknown property {name} on {kind}")]
    UnknownProperty {
        /// The entity kind queried.
        kind: EntityKind,
        /// The property name.
        name: String,
    },

    /// Value does not match the declared property type.
    #[error("type mismatch for {property}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The property name.
        property: String,
        /// The declared type.
        expected: ValueType,
        /// The type of the rejected value.
        actual: ValueType,
    },

    /// Property does not accept layer overrides.
    #[error("property {0} is not layered")]
    NotLayered(String),

    /// A stored reference points at nothing.
    #[error("stale reference from {from} to {to}")]
    StaleReference {
        /// The referencing entity.
        from: EntityId,
        /// The missing target.
        to: EntityId,
    },

    /// Cascade mapping could not resolve an entity; nothing was applied.
    #[error("cascade failed: {0} could not be resolved")]
    CascadeFailed(EntityId),

    /// Id is already in use.
    #[error("duplicate entity id: {0}")]
    DuplicateId(EntityId),

    /// Encoding or decoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// File system error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Entity the failing operation was acting on.
    pub entity: Option<EntityId>,
    /// Stack of operation names, outermost last.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entity.
    #[must_use]
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(entity) = self.entity {
            write!(f, "on {entity}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
