//! Tag and extension property registry edits.

use std::collections::BTreeSet;

use genogram_foundation::Result;
use genogram_storage::schema::attr_for;
use genogram_storage::{ExtensionSpec, Graph, RemovedExtension, ReplacedExtensions};

use crate::command::Command;

/// Replaces the tag registry.
///
/// Renaming or removing a tag also edits the tagged entities; the document
/// bundles those edits with this command in a
/// [`Compound`](crate::commands::Compound).
#[derive(Debug)]
pub struct SetTagRegistry {
    label: String,
    tags: BTreeSet<String>,
    was: Option<BTreeSet<String>>,
}

impl SetTagRegistry {
    /// Replaces the registry with `tags`.
    #[must_use]
    pub fn new(label: impl Into<String>, tags: BTreeSet<String>) -> Self {
        Self {
            label: label.into(),
            tags,
            was: None,
        }
    }
}

impl Command for SetTagRegistry {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.set_tags(self.tags.clone());
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(tags) = &self.was {
            graph.set_tags(tags.clone());
        }
        Ok(())
    }
}

/// Registers an event extension property.
#[derive(Debug)]
pub struct AddExtensionProperty {
    index: Option<usize>,
    spec: ExtensionSpec,
}

impl AddExtensionProperty {
    /// Adds `spec` at `index`, or at the end.
    #[must_use]
    pub fn new(index: Option<usize>, spec: ExtensionSpec) -> Self {
        Self { index, spec }
    }
}

impl Command for AddExtensionProperty {
    fn label(&self) -> String {
        format!("Add event property \"{}\"", self.spec.name)
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let index = graph.add_extension(self.index, self.spec.clone())?;
        self.index = Some(index);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        graph.remove_extension(&self.spec.attr).map(|_| ())
    }
}

/// Unregisters an event extension property.
///
/// The values every event held are cached on apply and restored on revert.
#[derive(Debug)]
pub struct RemoveExtensionProperty {
    attr: String,
    removed: Option<RemovedExtension>,
}

impl RemoveExtensionProperty {
    /// Removes the extension keyed `attr`.
    #[must_use]
    pub fn new(attr: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            removed: None,
        }
    }
}

impl Command for RemoveExtensionProperty {
    fn label(&self) -> String {
        format!("Remove event property \"{}\"", self.attr)
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        self.removed = Some(graph.remove_extension(&self.attr)?);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        match &self.removed {
            Some(removed) => graph.restore_extension(removed),
            None => Ok(()),
        }
    }
}

/// Renames an event extension property, moving its values to the new key.
#[derive(Debug)]
pub struct RenameExtensionProperty {
    attr: String,
    name: String,
    was: Option<String>,
}

impl RenameExtensionProperty {
    /// Renames the extension keyed `attr` to `name`.
    #[must_use]
    pub fn new(attr: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            attr: attr.into(),
            name: name.into(),
            was: None,
        }
    }
}

impl Command for RenameExtensionProperty {
    fn label(&self) -> String {
        format!("Rename event property to \"{}\"", self.name)
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        let previous = graph.rename_extension(&self.attr, &self.name)?;
        self.was.get_or_insert(previous);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        if let Some(name) = &self.was {
            graph.rename_extension(&attr_for(&self.name), name)?;
        }
        Ok(())
    }
}

/// Swaps the whole event property registry in one step.
///
/// The old extensions' event values are cached on apply and written back on
/// revert.
#[derive(Debug)]
pub struct ReplaceExtensions {
    specs: Vec<ExtensionSpec>,
    replaced: Option<ReplacedExtensions>,
}

impl ReplaceExtensions {
    /// Replaces the registry with `specs`, in order.
    #[must_use]
    pub fn new(specs: Vec<ExtensionSpec>) -> Self {
        Self {
            specs,
            replaced: None,
        }
    }
}

impl Command for ReplaceExtensions {
    fn label(&self) -> String {
        "Replace event properties".to_string()
    }

    fn apply(&mut self, graph: &mut Graph) -> Result<()> {
        self.replaced = Some(graph.replace_extensions(self.specs.clone())?);
        Ok(())
    }

    fn revert(&mut self, graph: &mut Graph) -> Result<()> {
        match &self.replaced {
            Some(replaced) => graph.restore_extensions(replaced),
            None => Ok(()),
        }
    }
}
