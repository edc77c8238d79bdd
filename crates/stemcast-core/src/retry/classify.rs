//! Classify task errors into retry policy error kinds.

use crate::error::TaskError;
use crate::retry::policy::ErrorKind;

/// Map a stage failure to its retry classification.
pub fn classify(e: &TaskError) -> ErrorKind {
    match e {
        TaskError::Separation(_) | TaskError::Render(_) => ErrorKind::Media,
        TaskError::Quota(_) => ErrorKind::Quota,
        TaskError::Transient(_) => ErrorKind::Transient,
        TaskError::Auth(_) => ErrorKind::Auth,
        TaskError::PlaylistNotFound(_) => ErrorKind::NotFound,
        TaskError::Cancelled(_) => ErrorKind::Cancelled,
        TaskError::InvalidSpec(_) => ErrorKind::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_errors_retryable() {
        assert_eq!(classify(&TaskError::Separation("oom".into())), ErrorKind::Media);
        assert_eq!(classify(&TaskError::Render("codec".into())), ErrorKind::Media);
    }

    #[test]
    fn auth_classified_fatal() {
        assert_eq!(
            classify(&TaskError::Auth("token expired".into())),
            ErrorKind::Auth
        );
    }

    #[test]
    fn quota_and_transient_distinct() {
        assert_eq!(classify(&TaskError::Quota("daily cap".into())), ErrorKind::Quota);
        assert_eq!(
            classify(&TaskError::Transient("reset by peer".into())),
            ErrorKind::Transient
        );
    }

    #[test]
    fn cancellation_not_retried() {
        assert_eq!(classify(&TaskError::cancelled()), ErrorKind::Cancelled);
    }

    #[test]
    fn corrupt_spec_not_retried() {
        let kind = classify(&TaskError::InvalidSpec("no destination".into()));
        assert_eq!(kind, ErrorKind::Invalid);
        assert_eq!(
            crate::retry::RetryPolicy::default().decide(1, kind),
            crate::retry::RetryDecision::NoRetry
        );
    }
}
