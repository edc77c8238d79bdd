use std::time::Duration;

/// High-level classification of a stage failure for retry purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Collaborator failed producing media (separation/render). Retryable.
    Media,
    /// Destination quota exhausted; retryable with a longer backoff window.
    Quota,
    /// Network/infra blip. Retryable.
    Transient,
    /// Credentials invalid or expired. Retrying cannot succeed.
    Auth,
    /// Referenced destination resource does not exist. Not retried.
    NotFound,
    /// Cooperative cancellation. Not retried.
    Cancelled,
    /// Corrupt or inconsistent job record. Not retried.
    Invalid,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry the same stage after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps. Quota errors start from a longer
/// base delay since the destination API window is the limiting factor.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts per stage (including the first).
    pub max_attempts: u32,
    /// Base delay for standard backoff.
    pub base_delay: Duration,
    /// Base delay used for quota errors.
    pub quota_delay: Duration,
    /// Upper bound on any backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            quota_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `NoRetry` when the
    /// error kind is non-retryable or the attempt budget is spent.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        match kind {
            ErrorKind::Auth | ErrorKind::NotFound | ErrorKind::Cancelled | ErrorKind::Invalid => {
                return RetryDecision::NoRetry;
            }
            ErrorKind::Media | ErrorKind::Quota | ErrorKind::Transient => {}
        }
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        let base = match kind {
            ErrorKind::Quota => self.quota_delay,
            _ => self.base_delay,
        };
        // base * 2^(attempt-1), capped.
        let exp = 1u32 << attempt.saturating_sub(1).min(8);
        let delay = base.saturating_mul(exp).min(self.max_delay);
        RetryDecision::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_and_cancel_never_retried() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(1, ErrorKind::Auth), RetryDecision::NoRetry);
        assert_eq!(p.decide(1, ErrorKind::NotFound), RetryDecision::NoRetry);
        assert_eq!(p.decide(1, ErrorKind::Cancelled), RetryDecision::NoRetry);
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 20;
        let d1 = match p.decide(1, ErrorKind::Transient) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        let d2 = match p.decide(2, ErrorKind::Transient) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(d2 >= d1);

        let d_last = match p.decide(12, ErrorKind::Transient) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(d_last <= p.max_delay);
    }

    #[test]
    fn quota_backs_off_longer_than_transient() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 5;
        let q = match p.decide(1, ErrorKind::Quota) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        let t = match p.decide(1, ErrorKind::Transient) {
            RetryDecision::RetryAfter(d) => d,
            _ => panic!("expected retry"),
        };
        assert!(q > t);
    }

    #[test]
    fn respects_max_attempts() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert!(matches!(
            p.decide(1, ErrorKind::Media),
            RetryDecision::RetryAfter(_)
        ));
        assert!(matches!(
            p.decide(2, ErrorKind::Media),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, ErrorKind::Media), RetryDecision::NoRetry);
    }
}
