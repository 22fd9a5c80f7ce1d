//! Bounded retry with exponential backoff
//!
//! Wraps whole pipeline operations. The wrapped operation must be idempotent
//! at the manifest level: a re-run store writes a fresh manifest for the same
//! content id, which is safe because content ids are deterministic over the
//! ciphertext and shards are keyed by them.

use std::thread;
use std::time::Duration;
use tracing::warn;

/// Default attempt budget
pub const DEFAULT_ATTEMPTS: usize = 3;

/// Default delay before the second attempt; doubles after each failure
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Run `op` up to `attempts` times, sleeping between attempts with a delay
/// that starts at `initial_delay` and doubles each time. Returns the first
/// success or the last error.
pub fn retry<T, E, F>(attempts: usize, initial_delay: Duration, mut op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    let attempts = attempts.max(1);
    let mut delay = initial_delay;
    for attempt in 1..attempts {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(attempt, error = %err, "operation failed, retrying");
                thread::sleep(delay);
                delay *= 2;
            }
        }
    }
    op()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_success_first_try() {
        let calls = Cell::new(0);
        let result: Result<i32, String> = retry(3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_succeeds_on_later_attempt() {
        let calls = Cell::new(0);
        let result: Result<i32, String> = retry(3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err("transient".to_string())
            } else {
                Ok(7)
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_returns_last_error() {
        let calls = Cell::new(0);
        let result: Result<(), String> = retry(3, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Err(format!("failure {}", calls.get()))
        });
        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let calls = Cell::new(0);
        let result: Result<i32, String> = retry(0, Duration::from_millis(1), || {
            calls.set(calls.get() + 1);
            Ok(1)
        });
        assert_eq!(result, Ok(1));
        assert_eq!(calls.get(), 1);
    }
}
