//! Bounded status polling.
//!
//! [`StatusWaiter`] repeatedly fetches a resource's lifecycle status until it
//! reaches one of a set of target statuses. Any status outside the pending and
//! target sets ends the wait with an error, as does running out of time or a
//! failed fetch.
//!
//! Timing follows three parameters: an initial delay before the first fetch,
//! an exponential back-off between fetches that starts at 100ms and is capped
//! at 10s, and a minimum interval that the back-off never undercuts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::WaitConfig;
use crate::error::{JobQueueError, WaitFailureKind};

/// Status reported while the last fetch failed.
///
/// Distinct from every status the service can return.
pub const REFRESH_FAILED_STATUS: &str = "failed";

const INITIAL_BACKOFF: Duration = Duration::from_millis(100);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Waits for a status to move from a pending set into a target set.
#[derive(Debug, Clone)]
pub struct StatusWaiter<S> {
    pending: Vec<S>,
    target: Vec<S>,
    config: WaitConfig,
}

impl<S> StatusWaiter<S>
where
    S: PartialEq + Copy + Display,
{
    pub fn new(pending: impl Into<Vec<S>>, target: impl Into<Vec<S>>, config: WaitConfig) -> Self {
        Self {
            pending: pending.into(),
            target: target.into(),
            config,
        }
    }

    /// Polls `refresh` until it yields a target status.
    ///
    /// # Returns
    ///
    /// The target status that was observed, or a
    /// [`JobQueueError::WaitForState`] describing why the wait stopped.
    pub async fn wait<F, Fut>(&self, mut refresh: F) -> Result<S, JobQueueError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<S, JobQueueError>>,
    {
        // A timeout too large to represent never expires.
        let deadline = Instant::now().checked_add(self.config.timeout);
        let mut last_status: Option<S> = None;
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt: u32 = 0;

        let mut next_sleep = self.config.delay;
        loop {
            if !next_sleep.is_zero() {
                if let Some(deadline) = deadline {
                    let wake = Instant::now().checked_add(next_sleep);
                    if wake.map_or(true, |wake| wake > deadline) {
                        // Sleep out the remaining budget so the timeout is honored exactly.
                        tokio::time::sleep_until(deadline).await;
                        return Err(self.failure(WaitFailureKind::Timeout, last_status));
                    }
                }
                tokio::time::sleep(next_sleep).await;
            }

            attempt += 1;
            let status = match refresh().await {
                Ok(status) => status,
                Err(error) => {
                    tracing::debug!(attempt = attempt, error = %error, "Status refresh failed");
                    return Err(self.refresh_failed(error));
                }
            };
            tracing::debug!(attempt = attempt, status = %status, "Polled status");
            last_status = Some(status);

            if self.target.contains(&status) {
                return Ok(status);
            }
            if !self.pending.contains(&status) {
                return Err(self.failure(WaitFailureKind::UnexpectedState, last_status));
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                return Err(self.failure(WaitFailureKind::Timeout, last_status));
            }

            next_sleep = backoff.max(self.config.min_interval);
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
    }

    fn refresh_failed(&self, error: JobQueueError) -> JobQueueError {
        JobQueueError::WaitForState {
            message: "failed waiting for state".to_string(),
            kind: WaitFailureKind::RefreshFailed,
            target: self.target_list(),
            last_status: REFRESH_FAILED_STATUS.to_string(),
            source: Some(Box::new(error)),
        }
    }

    fn failure(&self, kind: WaitFailureKind, last_status: Option<S>) -> JobQueueError {
        JobQueueError::WaitForState {
            message: "failed waiting for state".to_string(),
            kind,
            target: self.target_list(),
            last_status: last_status
                .map(|s| s.to_string())
                .unwrap_or_default(),
            source: None,
        }
    }

    fn target_list(&self) -> String {
        self.target
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
