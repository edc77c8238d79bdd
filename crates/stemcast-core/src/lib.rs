pub mod config;
pub mod logging;

// Core modules
pub mod control;
pub mod error;
pub mod job_db;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod retry;
