//! The built-in commands.

mod compound;
mod layer;
mod property;
mod proposal;
mod registry;
mod relink;
mod structure;

pub use compound::Compound;
pub use layer::{RenameLayer, SetLayerActive, SetLayerOrder, SetLayerStoreGeometry};
pub use property::{PropertyEntry, SetProperty};
pub use proposal::AcceptProposal;
pub use registry::{
    AddExtensionProperty, RemoveExtensionProperty, RenameExtensionProperty, ReplaceExtensions,
    SetTagRegistry,
};
pub use relink::{SetEmotionPeople, SetEventParent};
pub use structure::{AddEntity, RemoveEntities, SetParents};
