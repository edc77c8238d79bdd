//! Job cancellation: shared cancel tokens, one per job.
//!
//! Every stem task of a job holds a clone of the job's token and checks it
//! cooperatively at stage boundaries. `cancel` flips the token; tasks that
//! have not yet started uploading fail with a cancellation error, while a
//! task already uploading finishes its in-flight call first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::model::JobId;

/// Shared registry of job id -> cancel token. The orchestrator registers a
/// job at submission and unregisters it once the job reaches a terminal
/// status; `cancel` flips the token for all of the job's tasks at once.
#[derive(Default)]
pub struct CancelRegistry {
    jobs: RwLock<HashMap<JobId, Arc<AtomicBool>>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job; returns the token shared by its stem tasks.
    pub fn register(&self, job_id: JobId) -> Arc<AtomicBool> {
        let token = Arc::new(AtomicBool::new(false));
        self.jobs
            .write()
            .unwrap()
            .insert(job_id, Arc::clone(&token));
        token
    }

    /// Unregister a job (call once the job is terminal).
    pub fn unregister(&self, job_id: JobId) {
        self.jobs.write().unwrap().remove(&job_id);
    }

    /// Token for a registered job, if any.
    pub fn token(&self, job_id: JobId) -> Option<Arc<AtomicBool>> {
        self.jobs.read().unwrap().get(&job_id).cloned()
    }

    /// Request cancellation. Returns false if the job is not registered
    /// (unknown or already terminal).
    pub fn cancel(&self, job_id: JobId) -> bool {
        match self.jobs.read().unwrap().get(&job_id) {
            Some(token) => {
                token.store(true, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_flips_shared_token() {
        let reg = CancelRegistry::new();
        let token = reg.register(7);
        assert!(!token.load(Ordering::Relaxed));
        assert!(reg.cancel(7));
        assert!(token.load(Ordering::Relaxed));
    }

    #[test]
    fn cancel_unknown_job_is_noop() {
        let reg = CancelRegistry::new();
        assert!(!reg.cancel(42));
    }

    #[test]
    fn unregister_drops_token() {
        let reg = CancelRegistry::new();
        let _ = reg.register(1);
        reg.unregister(1);
        assert!(reg.token(1).is_none());
        assert!(!reg.cancel(1));
    }
}
