//! Session state: one open diagram and where it lives on disk.

use std::path::{Path, PathBuf};

use genogram_foundation::{Error, ErrorKind, Result};
use genogram_history::Document;
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::format::{self, Format};
use crate::serialize::{self, DiagramData, ReadReport};

/// An open diagram with its file path and load report.
pub struct Session {
    document: Document,
    path: Option<PathBuf>,
    config: RuntimeConfig,
    report: ReadReport,
}

impl Session {
    /// Creates a session with an empty, unsaved diagram.
    #[must_use]
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            document: Document::with_config(config.document("Untitled")),
            path: None,
            config,
            report: ReadReport::default(),
        }
    }

    /// Opens a diagram file, pruning whatever no longer resolves.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn open<P: AsRef<Path>>(path: P, config: RuntimeConfig) -> Result<Self> {
        let path = path.as_ref();
        let data = format::load_from_file(path)?;
        let (graph, report) = serialize::read(&data)?;
        if !report.is_clean() {
            warn!(
                path = %path.display(),
                pruned = report.pruned_count(),
                dissolved = report.dissolved.len(),
                "diagram was repaired while loading"
            );
        }
        let name = path
            .file_stem()
            .map_or_else(|| "Untitled".to_string(), |s| s.to_string_lossy().into_owned());
        Ok(Self {
            document: Document::from_graph(graph, config.document(name)),
            path: Some(path.to_path_buf()),
            config,
            report,
        })
    }

    /// Returns the open document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the open document for editing.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Returns the file this diagram was opened from or last saved to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Returns what loading repaired.
    #[must_use]
    pub fn report(&self) -> &ReadReport {
        &self.report
    }

    /// Returns true if there are unsaved edits.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.document.is_modified()
    }

    /// Captures the diagram as persisted data.
    #[must_use]
    pub fn snapshot(&self) -> DiagramData {
        serialize::write(self.document.graph()).with_pruned(self.report.pruned_count())
    }

    /// Saves to the current path.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no path yet or the write fails.
    pub fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Err(Error::new(ErrorKind::Io(
                "no file name: use 'save <path>'".to_string(),
            )));
        };
        self.save_as(path)
    }

    /// Saves to `path` and makes it the current path.
    ///
    /// The encoding follows the file extension when it names one, otherwise
    /// the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = Format::from_path(path).unwrap_or(self.config.format);
        format::save_to_file(&self.snapshot(), path, format)?;
        self.document.mark_saved();
        self.path = Some(path.to_path_buf());
        info!(path = %path.display(), "session saved");
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
