//! # Poller
//!
//! Generic bounded wait-for-condition primitive used to await asynchronous
//! state transitions on the target service.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Tuning for a single wait: how often to re-evaluate and when to give up.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Delay between condition evaluations
    pub interval: Duration,
    /// Total wall-clock budget for the wait
    pub timeout: Duration,
    /// Description for logging purposes
    pub description: String,
}

impl WaitConfig {
    pub fn new(interval: Duration, timeout: Duration, description: impl Into<String>) -> Self {
        Self { interval, timeout, description: description.into() }
    }

    /// Replace the description, keeping the tuning
    pub fn named(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(60),
            description: "condition".to_string(),
        }
    }
}

/// Repeatedly evaluate `condition` until it returns `Ok` or the timeout
/// elapses.
///
/// An `Err` from the condition means "not yet satisfied" and is swallowed;
/// the first `Ok` is returned immediately and no further evaluations occur.
/// Elapsed time is checked once per iteration; once it reaches the timeout
/// the condition is evaluated exactly one final time and that result —
/// error included — is returned to the caller. The propagated error is
/// therefore the condition's own last failure, not a generic timeout.
///
/// The condition must be safe to re-evaluate: it is called an unbounded
/// number of times within the budget and once more after it, so it may not
/// carry side effects that change meaning across calls.
pub async fn wait_until<F, Fut, T, E>(config: &WaitConfig, mut condition: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        match condition().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        description = %config.description,
                        "Condition satisfied"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if start.elapsed() >= config.timeout {
                    warn!(
                        attempt,
                        timeout_ms = config.timeout.as_millis() as u64,
                        error = %err,
                        description = %config.description,
                        "Wait exhausted, evaluating once more for the definitive error"
                    );
                    return condition().await;
                }
                debug!(
                    attempt,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %err,
                    description = %config.description,
                    "Condition not yet satisfied"
                );
            }
        }
        sleep(config.interval).await;
    }
}
