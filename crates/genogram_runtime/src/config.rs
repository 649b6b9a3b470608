//! Configuration for a runtime session.

use genogram_history::{DEFAULT_UNDO_LIMIT, DocumentConfig};

use crate::format::Format;

/// Default `tracing` filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Configuration for a runtime session.
///
/// Controls the save encoding, log verbosity, and history retention.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Encoding used when saving.
    pub format: Format,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Maximum undo steps kept (None = unbounded).
    pub undo_limit: Option<usize>,

    /// Print the banner when the REPL starts.
    pub show_banner: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            undo_limit: Some(DEFAULT_UNDO_LIMIT),
            show_banner: true,
        }
    }
}

impl RuntimeConfig {
    /// Creates a configuration for scripted use: no banner, quiet logs.
    #[must_use]
    pub fn batch() -> Self {
        Self {
            show_banner: false,
            log_filter: "error".to_string(),
            ..Self::default()
        }
    }

    /// Builder method to set the save encoding.
    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    /// Builder method to set the log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Builder method to set the undo limit.
    #[must_use]
    pub fn with_undo_limit(mut self, limit: Option<usize>) -> Self {
        self.undo_limit = limit;
        self
    }

    /// Builder method to toggle the banner.
    #[must_use]
    pub fn with_banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    /// Document configuration for a diagram with the given name.
    #[must_use]
    pub fn document(&self, name: impl Into<String>) -> DocumentConfig {
        DocumentConfig::default()
            .with_name(name)
            .with_undo_limit(self.undo_limit)
    }
}
