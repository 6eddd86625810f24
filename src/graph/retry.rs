//! Retry budgets for throttled requests.
//!
//! Two layers can retry a throttled write: the sink client itself and the
//! bulk executor. Only one of them may own a given call path, otherwise every
//! throttle is retried `client × executor` times. The client budget is raised
//! while the executor initializes and set to zero for the writes it issues.

use std::future::Future;
use std::time::Duration;

use crate::error::SinkError;

/// Client-level retry budget for throttled requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    pub max_attempts_on_throttle: u32,
    /// Upper bound on the total time spent waiting between attempts.
    pub max_wait: Duration,
}

impl RetryOptions {
    /// Budget used while the bulk executor initializes.
    pub fn initialization() -> Self {
        Self {
            max_attempts_on_throttle: 9,
            max_wait: Duration::from_secs(30),
        }
    }

    /// No client retries; throttles surface to the caller immediately.
    pub fn disabled() -> Self {
        Self {
            max_attempts_on_throttle: 0,
            max_wait: Duration::ZERO,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_attempts_on_throttle == 0
    }
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::initialization()
    }
}

/// Exponential backoff between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub factor: u32,
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based). A server hint wins.
    pub fn delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        if let Some(hint) = hint {
            return hint.min(self.max);
        }
        let factor = self.factor.saturating_pow(attempt);
        self.initial.saturating_mul(factor).min(self.max)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(5),
            factor: 2,
        }
    }
}

/// Runs `op`, retrying throttles within `options`.
///
/// Non-throttle errors and throttles past the budget are returned as is.
pub async fn with_client_retries<T, F, Fut>(options: &RetryOptions, mut op: F) -> Result<T, SinkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SinkError>>,
{
    let backoff = BackoffPolicy::default();
    let mut attempt = 0;
    let mut waited = Duration::ZERO;

    loop {
        match op().await {
            Err(err) if err.is_throttle() && attempt < options.max_attempts_on_throttle => {
                let delay = backoff.delay(attempt, err.retry_after());
                if waited + delay > options.max_wait {
                    return Err(err);
                }
                tracing::debug!(attempt, ?delay, "client retry after throttle");
                tokio::time::sleep(delay).await;
                waited += delay;
                attempt += 1;
            }
            result => return result,
        }
    }
}
