//! Bounded retries for blocking UI calls.

use std::time::Duration;

use crate::error::{IpcError, RetryError};

/// How often a failing UI call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one. Zero behaves as one.
    pub max_attempts: u32,
    /// Pause between attempts. The pause blocks the calling thread, which
    /// is the event loop, so keep it short.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, backoff: Duration::ZERO }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and no pause.
    pub fn attempts(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }

    /// Policy with `max_attempts` attempts and `backoff` between them.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    /// Run `op` until it succeeds, fails permanently or runs out of attempts.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T>(
        &self,
        operation: &'static str,
        mut op: impl FnMut(u32) -> Result<T, IpcError>,
    ) -> Result<T, RetryError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(last) if !last.is_transient() || attempt >= max_attempts => {
                    return Err(RetryError { operation, attempts: attempt, last });
                },
                Err(err) => {
                    tracing::warn!(operation, attempt, max_attempts, %err, "ui call failed, retrying");
                    if !self.backoff.is_zero() {
                        std::thread::sleep(self.backoff);
                    }
                    attempt += 1;
                },
            }
        }
    }
}
