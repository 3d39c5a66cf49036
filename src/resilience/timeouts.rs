//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap downstream calls with a deadline
//! - Report expiry as a distinct error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry
//! - Deadlines are absolute so nested calls (login + lookup) share one deadline

use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// The deadline passed before the wrapped operation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline exceeded")]
pub struct TimeoutError;

/// Absolute deadline `timeout` from now.
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

/// Time left until `deadline`, or `None` if it has passed.
pub fn remaining(deadline: Instant) -> Option<Duration> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        None
    } else {
        Some(left)
    }
}

/// Run `fut` until it completes or `deadline` passes.
pub async fn with_deadline<F, T>(deadline: Instant, fut: F) -> Result<T, TimeoutError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout_at(tokio::time::Instant::from_std(deadline), fut)
        .await
        .map_err(|_| TimeoutError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completes_before_deadline() {
        let deadline = deadline_after(Duration::from_secs(1));
        let value = with_deadline(deadline, async { 7 }).await;
        assert_eq!(value, Ok(7));
    }

    #[tokio::test]
    async fn test_expires() {
        let deadline = deadline_after(Duration::from_millis(20));
        let result = with_deadline(deadline, tokio::time::sleep(Duration::from_secs(5))).await;
        assert_eq!(result, Err(TimeoutError));
    }

    #[test]
    fn test_remaining_after_deadline_is_none() {
        let past = Instant::now();
        std::thread::sleep(Duration::from_millis(2));
        assert!(remaining(past).is_none());
        assert!(remaining(deadline_after(Duration::from_secs(60))).is_some());
    }
}
