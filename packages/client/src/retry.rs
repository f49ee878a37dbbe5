//! Retry with exponential backoff for transient HTTP failures.
//!
//! [`RetryPolicy::run`] re-invokes a send closure on timeouts, connection
//! failures, HTTP 429 and the retryable 5xx statuses. Other 4xx responses
//! are permanent and returned immediately. When the budget runs out the
//! last response or failure is returned as-is so the caller can classify
//! it.

use std::time::Duration;

use crate::transport::{RawResponse, TransportFailure};

/// Status codes worth re-sending.
const RETRYABLE_STATUSES: &[u16] = &[429, 500, 502, 503, 504];

/// How many times and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-sends after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_retries: u32, backoff_factor: Duration) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Backoff before retry number `attempt` (1-based):
    /// `backoff_factor * 2^(attempt - 1)`.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_factor.saturating_mul(1u32 << exponent)
    }

    /// Returns `true` if a response with this status should be re-sent.
    #[must_use]
    pub fn is_retryable_status(status: u16) -> bool {
        RETRYABLE_STATUSES.contains(&status)
    }

    /// Runs `send` until it succeeds, fails permanently, or the retry
    /// budget is spent. `sleep` is called with each backoff delay.
    ///
    /// # Errors
    ///
    /// Returns the last [`TransportFailure`] if every attempt failed at the
    /// transport level, or a non-transient failure immediately.
    pub fn run<F, S>(&self, mut send: F, sleep: S) -> Result<RawResponse, TransportFailure>
    where
        F: FnMut() -> Result<RawResponse, TransportFailure>,
        S: Fn(Duration),
    {
        let max_retries = self.max_retries;
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let delay = self.delay(attempt);
                log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
                sleep(delay);
            }

            let exhausted = attempt >= max_retries;

            match send() {
                Err(failure) => {
                    if failure.is_transient() && !exhausted {
                        log::warn!("  transient error: {failure}");
                    } else {
                        return Err(failure);
                    }
                }
                Ok(response) => {
                    if Self::is_retryable_status(response.status) && !exhausted {
                        log::warn!("  HTTP {} from {}", response.status, response.url);
                    } else {
                        return Ok(response);
                    }
                }
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;

    fn response(status: u16) -> RawResponse {
        RawResponse {
            status,
            url: "https://api.example.com/test".to_owned(),
            body: String::new(),
        }
    }

    fn run_script(
        policy: RetryPolicy,
        script: Vec<Result<RawResponse, TransportFailure>>,
    ) -> (Result<RawResponse, TransportFailure>, usize, Vec<Duration>) {
        let script = RefCell::new(VecDeque::from(script));
        let calls = RefCell::new(0);
        let delays = RefCell::new(Vec::new());

        let result = policy.run(
            || {
                *calls.borrow_mut() += 1;
                script.borrow_mut().pop_front().unwrap()
            },
            |d| delays.borrow_mut().push(d),
        );

        (result, calls.into_inner(), delays.into_inner())
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_secs(1));
        assert_eq!(policy.delay(3), Duration::from_secs(2));
    }

    #[test]
    fn success_is_not_retried() {
        let (result, calls, delays) = run_script(RetryPolicy::default(), vec![Ok(response(200))]);
        assert_eq!(result.unwrap().status, 200);
        assert_eq!(calls, 1);
        assert!(delays.is_empty());
    }

    #[test]
    fn retries_server_errors_then_succeeds() {
        let (result, calls, delays) = run_script(
            RetryPolicy::default(),
            vec![Ok(response(503)), Ok(response(429)), Ok(response(200))],
        );
        assert_eq!(result.unwrap().status, 200);
        assert_eq!(calls, 3);
        assert_eq!(
            delays,
            vec![Duration::from_millis(500), Duration::from_secs(1)]
        );
    }

    #[test]
    fn returns_last_retryable_response_when_exhausted() {
        let (result, calls, _) = run_script(
            RetryPolicy::new(2, Duration::ZERO),
            vec![Ok(response(500)), Ok(response(500)), Ok(response(502))],
        );
        assert_eq!(result.unwrap().status, 502);
        assert_eq!(calls, 3);
    }

    #[test]
    fn client_errors_are_permanent() {
        let (result, calls, _) = run_script(RetryPolicy::default(), vec![Ok(response(404))]);
        assert_eq!(result.unwrap().status, 404);
        assert_eq!(calls, 1);
    }

    #[test]
    fn retries_transient_failures() {
        let (result, calls, _) = run_script(
            RetryPolicy::new(1, Duration::ZERO),
            vec![
                Err(TransportFailure::Connection("reset".to_owned())),
                Ok(response(200)),
            ],
        );
        assert_eq!(result.unwrap().status, 200);
        assert_eq!(calls, 2);
    }

    #[test]
    fn gives_up_on_transient_failure_after_budget() {
        let (result, calls, _) = run_script(
            RetryPolicy::new(1, Duration::ZERO),
            vec![
                Err(TransportFailure::ReadTimeout("slow".to_owned())),
                Err(TransportFailure::ReadTimeout("slow".to_owned())),
            ],
        );
        assert_eq!(
            result.unwrap_err(),
            TransportFailure::ReadTimeout("slow".to_owned())
        );
        assert_eq!(calls, 2);
    }

    #[test]
    fn other_failures_are_not_retried() {
        let (result, calls, _) = run_script(
            RetryPolicy::default(),
            vec![Err(TransportFailure::Other("bad url".to_owned()))],
        );
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
