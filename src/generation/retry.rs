use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::GenerationError;

/// Exponential backoff with full jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: usize,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    /// Random delay in `0..=min(base * 2^(attempt-1), max)`.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let exponential = self
            .base_delay_ms
            .saturating_mul(1_u64.checked_shl((attempt - 1) as u32).unwrap_or(u64::MAX));
        let capped = exponential.min(self.max_delay_ms);
        if capped == 0 {
            return Duration::ZERO;
        }

        Duration::from_millis(rand::rng().random_range(0..=capped))
    }

    /// Runs `operation` until it succeeds, fails permanently, or attempts
    /// run out.
    pub fn run<T>(
        &self,
        label: &str,
        mut operation: impl FnMut() -> Result<T, GenerationError>,
    ) -> Result<T, GenerationError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < attempts => {
                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt);
                    warn!(
                        operation = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );
                    thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn unavailable() -> GenerationError {
        GenerationError::Status {
            endpoint: "chat/completions".to_string(),
            status: 503,
            body: String::new(),
        }
    }

    fn no_wait(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    #[test]
    fn delay_is_zero_for_first_attempt_and_capped_afterwards() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 100,
            max_delay_ms: 500,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert!(policy.delay_for_attempt(1) <= Duration::from_millis(100));
        assert!(policy.delay_for_attempt(2) <= Duration::from_millis(200));
        assert!(policy.delay_for_attempt(80) <= Duration::from_millis(500));
    }

    #[test]
    fn retries_transient_errors_until_success() {
        let calls = Cell::new(0);
        let result = no_wait(3).run("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(unavailable())
            } else {
                Ok("done")
            }
        });
        assert_eq!(result.expect("third attempt succeeds"), "done");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), _> = no_wait(2).run("test", || {
            calls.set(calls.get() + 1);
            Err(unavailable())
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_errors_are_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), _> = no_wait(5).run("test", || {
            calls.set(calls.get() + 1);
            Err(GenerationError::EmptyCompletion)
        });
        assert!(matches!(result, Err(GenerationError::EmptyCompletion)));
        assert_eq!(calls.get(), 1);
    }
}
