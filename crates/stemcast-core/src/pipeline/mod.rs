//! Per-stem pipeline: collaborator contracts and the stem task state machine.

mod collaborators;
mod task;

pub use collaborators::{
    Collaborators, PlaylistService, Renderer, SeparationEngine, UploadService,
};
pub(crate) use task::{run_stem_task, StemTaskCtx};
