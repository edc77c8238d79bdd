//! Persistent job/stem-task database (SQLite via sqlx).
//!
//! Stores job specs, aggregate statuses, and per-stem task rows so jobs
//! survive a worker-process restart. The in-memory progress store stays the
//! source of truth at runtime; this database is updated write-behind.

pub mod db;
mod jobs;
pub mod types;

pub use db::JobDb;
pub(crate) use db::unix_timestamp;
pub use types::*;
