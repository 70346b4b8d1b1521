use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::BillingResult;

/// How often a lock-contended operation is re-run before the conflict is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or the attempts run out.
///
/// Each attempt must open its own transaction: a conflict rolls the previous one back.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut operation: F) -> BillingResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = BillingResult<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                warn!(attempt, max_attempts = policy.max_attempts, %error, "retrying after lock conflict");
                tokio::time::sleep(policy.delay_for(attempt)).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BillingError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn retries_concurrency_conflicts_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(fast(3), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(BillingError::ConcurrencyConflict("lock timeout".into()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: BillingResult<()> = with_retry(fast(2), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::ConcurrencyConflict("deadlock".into()))
        })
        .await;
        assert!(matches!(result, Err(BillingError::ConcurrencyConflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: BillingResult<()> = with_retry(fast(5), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BillingError::validation("bad input"))
        })
        .await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
