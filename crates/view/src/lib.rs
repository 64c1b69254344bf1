//! Core of the castle map client: view-mode state machine, level-of-detail
//! engine and their boundary to the rendering backend.

pub mod backend;
pub mod compass;
pub mod config;
pub mod error;
pub mod extrusions;
pub mod lod;
pub mod machine;
pub mod memory;
pub mod navigation;
pub mod registry;

#[cfg(test)]
mod scenarios;

pub use backend::{Interaction, MapBackend};
pub use config::ViewConfig;
pub use error::{BackendError, ViewError};
pub use lod::{ApplyReport, LodEngine};
pub use machine::{LodOutcome, Phase, TransitionOutcome, ViewEvent, ViewMode, ViewState};
pub use navigation::{ArrowKey, Modifiers};
pub use registry::{BasemapHandle, BasemapRegistry, BasemapSpec};
