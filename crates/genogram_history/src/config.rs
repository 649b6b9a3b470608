//! Configuration for a document.

/// Default number of undo steps a document keeps.
pub const DEFAULT_UNDO_LIMIT: usize = 500;

/// Configuration for a [`Document`](crate::Document).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Display name of the document.
    pub name: String,

    /// Maximum number of undo steps kept; `None` keeps everything.
    pub undo_limit: Option<usize>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            undo_limit: Some(DEFAULT_UNDO_LIMIT),
        }
    }
}

impl DocumentConfig {
    /// Creates a configuration that never prunes undo history.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            undo_limit: None,
            ..Self::default()
        }
    }

    /// Builder method to set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder method to set the undo limit.
    #[must_use]
    pub fn with_undo_limit(mut self, limit: Option<usize>) -> Self {
        self.undo_limit = limit;
        self
    }
}
