//! Bounded retry with backoff
//!
//! Used to confirm that an on-screen action actually changed the screen
//! before giving up on it. Attempt errors consume the same retry budget as
//! failed success checks; the final error propagates.

use std::thread;
use std::time::Duration;

use crate::Result;

/// Bounded retry-with-backoff executor.
#[derive(Debug, Clone)]
pub struct RetryHandler {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    exponential: bool,
}

impl RetryHandler {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration, exponential: bool) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            exponential,
        }
    }

    /// Backoff before retry number `attempt + 1`: `base * 2^attempt` capped
    /// at the maximum when exponential, else the constant base delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = if self.exponential {
            self.base_delay.saturating_mul(1u32 << attempt.min(31))
        } else {
            self.base_delay
        };
        delay.min(self.max_delay)
    }

    /// Run `action` until `success_check` accepts its result, retrying up to
    /// the budget with backoff in between. `on_retry(attempt, delay)` fires
    /// before each wait. Returns `Ok(None)` when every attempt completed but
    /// none passed the check; the last error when attempts keep failing.
    pub fn execute<T, A, S, R>(
        &self,
        mut action: A,
        mut success_check: S,
        mut on_retry: R,
    ) -> Result<Option<T>>
    where
        A: FnMut() -> Result<T>,
        S: FnMut(&T) -> bool,
        R: FnMut(u32, Duration),
    {
        for attempt in 0..=self.max_retries {
            match action() {
                Ok(result) => {
                    if success_check(&result) {
                        return Ok(Some(result));
                    }
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                }
            }
            if attempt < self.max_retries {
                let delay = self.delay_for(attempt);
                on_retry(attempt + 1, delay);
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
        Ok(None)
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(
            3,
            Duration::from_millis(500),
            Duration::from_secs(5),
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::Cell;

    fn instant_handler(max_retries: u32) -> RetryHandler {
        RetryHandler::new(max_retries, Duration::ZERO, Duration::ZERO, true)
    }

    #[test]
    fn exponential_backoff_doubles_and_caps() {
        let handler = RetryHandler::new(
            3,
            Duration::from_millis(300),
            Duration::from_secs(2),
            true,
        );
        assert_eq!(handler.delay_for(0), Duration::from_millis(300));
        assert_eq!(handler.delay_for(1), Duration::from_millis(600));
        assert_eq!(handler.delay_for(2), Duration::from_millis(1200));
        assert_eq!(handler.delay_for(3), Duration::from_secs(2));
    }

    #[test]
    fn constant_backoff_never_grows() {
        let handler = RetryHandler::new(
            3,
            Duration::from_millis(300),
            Duration::from_secs(2),
            false,
        );
        assert_eq!(handler.delay_for(0), Duration::from_millis(300));
        assert_eq!(handler.delay_for(4), Duration::from_millis(300));
    }

    #[test]
    fn returns_immediately_on_first_success() {
        let calls = Cell::new(0u32);
        let result = instant_handler(3)
            .execute(
                || {
                    calls.set(calls.get() + 1);
                    Ok(42)
                },
                |v| *v == 42,
                |_, _| {},
            )
            .unwrap();
        assert_eq!(result, Some(42));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exhausted_success_check_yields_none() {
        let retries = Cell::new(0u32);
        let result = instant_handler(3)
            .execute(|| Ok(0), |v| *v != 0, |attempt, _| retries.set(attempt))
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(retries.get(), 3);
    }

    #[test]
    fn action_errors_propagate_after_budget() {
        let calls = Cell::new(0u32);
        let result: Result<Option<()>> = instant_handler(2).execute(
            || {
                calls.set(calls.get() + 1);
                Err(anyhow!("screen gone"))
            },
            |_| true,
            |_, _| {},
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn recovers_when_a_later_attempt_succeeds() {
        let calls = Cell::new(0u32);
        let result = instant_handler(3)
            .execute(
                || {
                    calls.set(calls.get() + 1);
                    if calls.get() < 3 {
                        Err(anyhow!("transient"))
                    } else {
                        Ok("confirmed")
                    }
                },
                |_| true,
                |_, _| {},
            )
            .unwrap();
        assert_eq!(result, Some("confirmed"));
    }
}
