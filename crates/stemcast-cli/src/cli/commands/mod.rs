//! CLI command handlers, one file per command.

mod cancel;
mod remove;
mod run;
mod status;
mod submit;

pub use cancel::run_cancel;
pub use remove::run_remove;
pub use run::run_pipeline;
pub use status::run_status;
pub use submit::{run_submit, SubmitArgs};
