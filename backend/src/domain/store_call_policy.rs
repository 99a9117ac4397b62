//! Timeout and bounded retry around every record store call.
//!
//! Reads are retried on connection failures and timeouts. Writes are retried
//! only on connection failures: a timed-out write may or may not have landed,
//! so it is surfaced to the caller and left to repair.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::ports::RecordStoreError;

/// Default per-call timeout.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(2);
/// Default number of attempts, including the first.
pub const DEFAULT_STORE_ATTEMPTS: u32 = 3;
/// Default delay before the first retry.
pub const DEFAULT_STORE_BACKOFF: Duration = Duration::from_millis(50);

/// Delay strategy between attempts.
pub trait BackoffJitter: Send + Sync {
    /// Delay before retry number `attempt` (1-based) given the base backoff.
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration;
}

/// Exponential backoff with up to half the step added at random.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl BackoffJitter for RandomJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let step = base.saturating_mul(1_u32 << exponent);
        let step_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX);
        let extra = rand::thread_rng().gen_range(0..=step_ms / 2);
        step.saturating_add(Duration::from_millis(extra))
    }
}

/// Plain exponential backoff; keeps test timings deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32) -> Duration {
        base.saturating_mul(1_u32 << attempt.saturating_sub(1).min(16))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Read,
    Write,
}

impl CallKind {
    fn retries(self, error: &RecordStoreError) -> bool {
        match self {
            Self::Read => error.is_transient(),
            Self::Write => matches!(error, RecordStoreError::Connection { .. }),
        }
    }
}

/// Timeout and retry settings applied to store calls.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use harbour::domain::StoreCallPolicy;
/// use harbour::domain::ports::RecordStoreError;
///
/// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
/// let policy = StoreCallPolicy::new(Duration::from_millis(100), 2, Duration::ZERO);
/// let value = policy
///     .read("boats.get", || async { Ok::<_, RecordStoreError>(7) })
///     .await
///     .expect("read succeeds");
/// assert_eq!(value, 7);
/// # });
/// ```
#[derive(Clone)]
pub struct StoreCallPolicy {
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
    jitter: Arc<dyn BackoffJitter>,
}

impl Default for StoreCallPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_STORE_TIMEOUT,
            DEFAULT_STORE_ATTEMPTS,
            DEFAULT_STORE_BACKOFF,
        )
    }
}

impl std::fmt::Debug for StoreCallPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCallPolicy")
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .field("base_backoff", &self.base_backoff)
            .finish_non_exhaustive()
    }
}

impl StoreCallPolicy {
    /// Build a policy with random jitter. At least one attempt is always made.
    #[must_use]
    pub fn new(timeout: Duration, max_attempts: u32, base_backoff: Duration) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
            base_backoff,
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Replace the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, jitter: Arc<dyn BackoffJitter>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Run a read, retrying connection failures and timeouts.
    pub async fn read<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, RecordStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RecordStoreError>>,
    {
        self.run(CallKind::Read, operation, call).await
    }

    /// Run a write, retrying connection failures only.
    pub async fn write<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, RecordStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RecordStoreError>>,
    {
        self.run(CallKind::Write, operation, call).await
    }

    async fn run<T, F, Fut>(
        &self,
        kind: CallKind,
        operation: &str,
        mut call: F,
    ) -> Result<T, RecordStoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RecordStoreError>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(RecordStoreError::timeout(operation)),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && kind.retries(&error) => {
                    let delay = self.jitter.jittered_delay(self.base_backoff, attempt);
                    debug!(operation, attempt, ?delay, %error, "retrying store call");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => {
                    if error.is_transient() {
                        warn!(operation, attempt, %error, "store call failed");
                    }
                    return Err(error);
                }
            }
        }
    }
}
