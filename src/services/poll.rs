use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum PollError<E> {
    #[error("Gave up after {0:?}")]
    TimedOut(Duration),

    #[error("Polling cancelled")]
    Cancelled,

    #[error("Check failed: {0}")]
    Check(E),
}

#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Call `check` every `interval` until it yields a value
///
/// The first check runs immediately. Stops with `Cancelled` once the cancel
/// flag turns true; a dropped cancel sender just means no cancellation can
/// arrive anymore. A check still running at the deadline is abandoned. A zero interval
/// is treated as one millisecond.
pub async fn poll_until<T, E, F, Fut>(
    options: PollOptions,
    mut cancel: watch::Receiver<bool>,
    mut check: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = Instant::now() + options.timeout;
    let mut ticker = time::interval(options.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cancel_open = true;
    let mut attempts = 0u32;

    loop {
        if *cancel.borrow() {
            return Err(PollError::Cancelled);
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = time::sleep_until(deadline) => {
                tracing::debug!("Polling timed out after {} attempts", attempts);
                return Err(PollError::TimedOut(options.timeout));
            }
            changed = cancel.changed(), if cancel_open => {
                if changed.is_err() {
                    cancel_open = false;
                }
                continue;
            }
        }

        attempts += 1;
        match time::timeout_at(deadline, check()).await {
            Ok(Ok(Some(value))) => {
                tracing::debug!("Polling satisfied after {} attempts", attempts);
                return Ok(value);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => return Err(PollError::Check(e)),
            Err(_) => return Err(PollError::TimedOut(options.timeout)),
        }
    }
}
