//! Drives asynchronous remote operations to their terminal state.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use crate::compute::{ComputeApi, ComputeError, Operation};

/// Transport retries granted to ordinary operations.
pub const DEFAULT_TRANSPORT_RETRIES: u32 = 5;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Errors raised while waiting on an operation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum WaitError {
    /// A re-fetch failed after the transport retry budget was spent.
    #[error(transparent)]
    Transport(#[from] ComputeError),
    /// The operation reached its terminal state carrying sub-errors.
    #[error("operation {operation} failed: {message}")]
    Failed {
        /// Name of the failed operation.
        operation: String,
        /// Aggregated `code: message` pairs of every sub-error.
        message: String,
    },
}

/// Polls one operation handle until it is terminal.
///
/// Transport failures during a re-fetch are retried a bounded number of
/// times; the counter resets whenever a re-fetch succeeds, so the budget
/// bounds consecutive failures, not total ones. There is no wall-clock bound:
/// an operation that stays non-terminal without erroring is polled forever,
/// and callers needing a timeout must wrap the wait externally.
#[derive(Clone, Copy, Debug)]
pub struct OperationPoller {
    max_retries: u32,
    poll_interval: Duration,
}

impl Default for OperationPoller {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSPORT_RETRIES)
    }
}

impl OperationPoller {
    /// Creates a poller with the given transport retry budget.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self { max_retries, poll_interval: POLL_INTERVAL }
    }

    /// Overrides the poll interval; used by tests to keep waits fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Waits until `operation` is terminal and returns the final handle.
    ///
    /// A 404 on re-fetch returns the last known handle: the remote system
    /// garbage-collects finished operation records, so absence means the
    /// operation completed before the poll loop observed it.
    ///
    /// # Errors
    ///
    /// Returns [`WaitError::Transport`] when re-fetching fails more than
    /// `max_retries` times in a row, and [`WaitError::Failed`] when the
    /// terminal operation reports sub-errors.
    pub async fn await_done<C: ComputeApi + ?Sized>(
        &self,
        compute: &C,
        operation: Operation,
    ) -> Result<Operation, WaitError> {
        let mut current = operation;
        let mut consecutive_failures: u32 = 0;

        while !current.is_done() {
            let zone = current.zone.clone().unwrap_or_default();
            let fetched = compute.get_operation(&zone, &current.name).await;
            match fetched {
                Ok(Some(fresh)) => {
                    consecutive_failures = 0;
                    current = fresh;
                    if current.is_done() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) if err.is_transient() => {
                    consecutive_failures += 1;
                    if consecutive_failures > self.max_retries {
                        return Err(WaitError::Transport(err));
                    }
                }
                Err(err) => return Err(WaitError::Transport(err)),
            }
            sleep(self.poll_interval).await;
        }

        if let Some(message) = current.error_summary() {
            return Err(WaitError::Failed { operation: current.name, message });
        }
        Ok(current)
    }
}
