//! Retry and backoff policy for stem task stages.
//!
//! Encapsulates error classification (auth, quota, transient, media) and
//! exponential backoff decisions so every stage of every task shares a
//! consistent policy.

mod classify;
mod policy;
mod run;

pub use classify::classify;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
