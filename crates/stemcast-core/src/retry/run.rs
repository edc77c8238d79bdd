//! Retry loop: run a stage closure until success or the policy says stop.

use std::time::Duration;

use crate::error::TaskError;

use super::classify;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs a closure until it succeeds or the retry policy says to stop.
/// On retryable failure, invokes `on_retry(next_attempt, error, delay)`
/// (so the caller can record the attempt), sleeps, then tries again.
///
/// Blocking: intended for worker threads, not async tasks.
pub fn run_with_retry<T, F, R>(
    policy: &RetryPolicy,
    mut f: F,
    mut on_retry: R,
) -> Result<T, TaskError>
where
    F: FnMut() -> Result<T, TaskError>,
    R: FnMut(u32, &TaskError, Duration),
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                let kind = classify::classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        attempt += 1;
                        on_retry(attempt, &e, d);
                        std::thread::sleep(d);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            quota_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let mut retries = Vec::new();
        let out = run_with_retry(
            &fast_policy(),
            || {
                calls += 1;
                if calls < 3 {
                    Err(TaskError::Transient("blip".into()))
                } else {
                    Ok(calls)
                }
            },
            |attempt, _, _| retries.push(attempt),
        );
        assert_eq!(out.unwrap(), 3);
        assert_eq!(retries, vec![2, 3]);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(
            &fast_policy(),
            || {
                calls += 1;
                Err(TaskError::Transient("down".into()))
            },
            |_, _, _| {},
        );
        assert!(matches!(out, Err(TaskError::Transient(_))));
        assert_eq!(calls, 3);
    }

    #[test]
    fn auth_error_fails_on_first_attempt() {
        let mut calls = 0;
        let out: Result<(), _> = run_with_retry(
            &fast_policy(),
            || {
                calls += 1;
                Err(TaskError::Auth("expired".into()))
            },
            |_, _, _| panic!("auth must not be retried"),
        );
        assert!(matches!(out, Err(TaskError::Auth(_))));
        assert_eq!(calls, 1);
    }
}
