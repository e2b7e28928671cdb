//! Bounded retry for status updates.
//!
//! Status text is advisory: after the last attempt fails the update is
//! dropped and the job carries on.

use crate::metrics;
use crate::notify::Notifier;
use crate::registry::JobHandle;
use backoff::backoff::{Backoff, Constant};
use std::time::Duration;

/// Attempts and fixed delay for one status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRetry {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub delay: Duration,
}

impl StatusRetry {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }
}

impl StatusRetry {
    /// Delays between attempts; exhausted after `attempts - 1` retries.
    pub fn backoff(&self) -> BoundedConstant {
        BoundedConstant {
            delay: Constant::new(self.delay),
            retries: self.attempts.saturating_sub(1),
            remaining: self.attempts.saturating_sub(1),
        }
    }
}

/// Constant delay that gives up after a fixed number of retries.
pub struct BoundedConstant {
    delay: Constant,
    retries: u32,
    remaining: u32,
}

impl Backoff for BoundedConstant {
    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.delay.next_backoff()
    }

    fn reset(&mut self) {
        self.remaining = self.retries;
    }
}

impl Default for StatusRetry {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Send `text` as the job's status, retrying transient failures.
///
/// Returns whether the update was delivered. Never fails the caller.
pub async fn deliver_status(
    notifier: &dyn Notifier,
    handle: &JobHandle,
    text: &str,
    retry: &StatusRetry,
) -> bool {
    let mut backoff = retry.backoff();
    let mut attempt = 1;

    loop {
        let e = match notifier.update_status(handle, text).await {
            Ok(()) => return true,
            Err(e) => e,
        };

        match backoff.next_backoff() {
            Some(delay) if e.is_retryable() => {
                tracing::warn!(
                    "Status update failed (attempt {}/{}), retrying in {:?}: {}",
                    attempt,
                    retry.attempts,
                    delay,
                    e
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            _ => {
                tracing::warn!(
                    requester = %handle.key(),
                    "Dropping status update after {} attempt(s): {}",
                    attempt,
                    e
                );
                break;
            }
        }
    }

    metrics::record_status_dropped();
    false
}
