//! Bounded fixed-interval polling.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Source of delays between polls.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeper.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// How many times to check and how long to wait between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// Run `probe` up to `policy.attempts` times, sleeping `policy.interval`
/// after each miss.
///
/// `on_attempt` runs before every probe with the zero-based attempt index.
/// Returns `Ok(None)` when every attempt missed.
pub async fn poll_bounded<T, A, P>(
    policy: &PollPolicy,
    sleeper: &dyn Sleeper,
    mut on_attempt: A,
    mut probe: P,
) -> Result<Option<T>>
where
    A: FnMut(u32),
    P: FnMut(u32) -> Result<Option<T>>,
{
    for attempt in 0..policy.attempts {
        on_attempt(attempt);
        if let Some(found) = probe(attempt)? {
            return Ok(Some(found));
        }
        sleeper.sleep(policy.interval).await;
    }
    Ok(None)
}
