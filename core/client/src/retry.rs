//! Retry policy with exponential backoff for transient HTTP failures.

use std::time::Duration;

use idealista_common::Error;

/// Statuses worth another attempt: rate limiting and transient server errors.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Wait before the first retry when the server gives no `Retry-After`.
    pub initial_backoff: Duration,
    /// Cap for the doubling backoff.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy with the standard 1 s initial backoff capped at 30 s.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }

    /// Set initial backoff.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Set maximum backoff.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

/// What to do after a failed attempt.
#[derive(Debug)]
pub enum RetryDecision {
    /// Sleep for `wait`, then try again. `cause` is the failure being retried.
    Retry { wait: Duration, cause: Error },
    /// Give up and surface the error.
    Fail(Error),
}

/// Per-request retry bookkeeping. Lives for one logical request only.
#[derive(Debug, Clone)]
pub struct RetryState {
    attempt: u32,
    backoff: Duration,
}

impl RetryState {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            attempt: 0,
            backoff: policy.initial_backoff.min(policy.max_backoff),
        }
    }

    /// Retries performed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Decide whether `error` should be retried.
    ///
    /// A server-provided `retry_after` replaces the backoff for this retry
    /// only; the backoff still doubles so later retries keep growing.
    pub fn decide(
        &mut self,
        policy: &RetryPolicy,
        error: Error,
        retry_after: Option<Duration>,
    ) -> RetryDecision {
        if !is_retryable(&error) || self.attempt >= policy.max_retries {
            return RetryDecision::Fail(error);
        }

        let wait = retry_after.unwrap_or(self.backoff);
        self.attempt += 1;
        self.backoff = self.backoff.saturating_mul(2).min(policy.max_backoff);

        RetryDecision::Retry { wait, cause: error }
    }
}

/// Check if an error is retryable.
pub fn is_retryable(error: &Error) -> bool {
    match error {
        Error::Http { status, .. } => RETRYABLE_STATUSES.contains(status),
        Error::Network(_) => true,
        _ => false,
    }
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values and negative numbers are not understood and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> Error {
        Error::Http {
            status,
            message: format!("HTTP {}", status),
            body: None,
        }
    }

    fn expect_retry(decision: RetryDecision) -> Duration {
        match decision {
            RetryDecision::Retry { wait, .. } => wait,
            RetryDecision::Fail(err) => panic!("expected retry, got failure: {}", err),
        }
    }

    #[test]
    fn test_retryable_statuses() {
        for status in [429, 500, 502, 503, 504] {
            assert!(is_retryable(&http(status)), "{} should retry", status);
        }
        for status in [400, 401, 403, 404, 409, 422, 501, 505] {
            assert!(!is_retryable(&http(status)), "{} should not retry", status);
        }
        assert!(is_retryable(&Error::Network("refused".to_string())));
        assert!(!is_retryable(&Error::MissingCredentials));
        assert!(!is_retryable(&Error::InvalidResponse("bad".to_string())));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10);
        let mut state = RetryState::new(&policy);

        let waits: Vec<u64> = (0..7)
            .map(|_| expect_retry(state.decide(&policy, http(503), None)).as_secs())
            .collect();

        assert_eq!(waits, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn test_retry_after_overrides_wait_but_backoff_grows() {
        let policy = RetryPolicy::new(3);
        let mut state = RetryState::new(&policy);

        let wait = expect_retry(state.decide(&policy, http(429), Some(Duration::from_secs(7))));
        assert_eq!(wait, Duration::from_secs(7));

        let wait = expect_retry(state.decide(&policy, http(429), None));
        assert_eq!(wait, Duration::from_secs(2));
    }

    #[test]
    fn test_budget_is_retries_beyond_first_attempt() {
        let policy = RetryPolicy::new(3);
        let mut state = RetryState::new(&policy);

        for _ in 0..3 {
            expect_retry(state.decide(&policy, http(500), None));
        }
        assert_eq!(state.attempt(), 3);

        match state.decide(&policy, http(500), None) {
            RetryDecision::Fail(err) => assert_eq!(err.status(), Some(500)),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_status_fails_immediately() {
        let policy = RetryPolicy::new(3);
        let mut state = RetryState::new(&policy);

        assert!(matches!(
            state.decide(&policy, http(400), Some(Duration::from_secs(1))),
            RetryDecision::Fail(_)
        ));
        assert_eq!(state.attempt(), 0);
    }

    #[test]
    fn test_zero_retries() {
        let policy = RetryPolicy::new(0);
        let mut state = RetryState::new(&policy);
        assert!(matches!(
            state.decide(&policy, Error::Network("reset".to_string()), None),
            RetryDecision::Fail(Error::Network(_))
        ));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(parse_retry_after("5"), Some(Duration::from_secs(5)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("soon"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
