//! Wall-clock bound for individual store calls.
//!
//! Each call runs on its own spawned task and is awaited with a deadline. A
//! stalled call therefore costs at most one timeout, never the whole run.
//!
//! # Abort Semantics
//! On timeout or cancellation the worker task is aborted. Abort is
//! cooperative: an async store future stops at its next await point, but a
//! store that blocks inside a call keeps running in the background until it
//! returns, and its result is then discarded.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::models::ExplorationStats;
use crate::store::{StoreError, StoreResult};

/// Outcome of one bounded store call. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundedOutcome<T> {
    /// The call returned within the deadline
    Completed(T),
    /// The deadline passed first; the worker was aborted
    TimedOut,
    /// The call or its task failed
    Failed(StoreError),
}

/// Results that change the caller's control flow instead of being reported
/// inline as a timeout or error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Escalation {
    /// The store refused access to the path
    #[error("{0}")]
    PermissionDenied(StoreError),

    /// The run was cancelled while waiting
    #[error("Exploration cancelled")]
    Cancelled,
}

/// Runs store calls with a hard deadline and records timeouts and errors.
#[derive(Debug, Clone)]
pub struct TimeoutGuard {
    timeout: Duration,
    cancel: CancellationToken,
}

impl TimeoutGuard {
    /// Creates a guard with a per-call deadline and no cancellation source.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `token` to interrupt waiting calls.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Whether the run's cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Runs `operation` with the configured deadline.
    ///
    /// Counter updates:
    /// - timeout: `stats.timeouts += 1`, returns `TimedOut`
    /// - failure: `stats.errors += 1`, returns `Failed`
    /// - permission denied: no counter change, returns `Escalation::PermissionDenied`
    ///
    /// # Arguments
    /// * `description` - Short description of the call, used in log messages
    /// * `stats` - Run counters
    /// * `operation` - The store call; it must own everything it uses
    ///
    /// # Errors
    /// Returns an `Escalation` on permission denial or cancellation
    pub async fn run_bounded<T, F>(
        &self,
        description: &str,
        stats: &mut ExplorationStats,
        operation: F,
    ) -> Result<BoundedOutcome<T>, Escalation>
    where
        T: Send + 'static,
        F: Future<Output = StoreResult<T>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(Escalation::Cancelled);
        }

        let mut handle = tokio::spawn(operation);

        let waited = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                handle.abort();
                return Err(Escalation::Cancelled);
            }
            waited = tokio::time::timeout(self.timeout, &mut handle) => waited,
        };

        match waited {
            Err(_) => {
                handle.abort();
                stats.timeouts += 1;
                warn!(
                    "Timed out after {:.1}s while trying to {}",
                    self.timeout.as_secs_f64(),
                    description
                );
                Ok(BoundedOutcome::TimedOut)
            }
            Ok(Err(join_error)) => {
                stats.errors += 1;
                error!("Store task failed while trying to {}: {}", description, join_error);
                Ok(BoundedOutcome::Failed(StoreError::other(format!(
                    "store task failed: {}",
                    join_error
                ))))
            }
            Ok(Ok(Ok(value))) => Ok(BoundedOutcome::Completed(value)),
            Ok(Ok(Err(e))) if e.is_permission_denied() => Err(Escalation::PermissionDenied(e)),
            Ok(Ok(Err(e))) => {
                stats.errors += 1;
                error!("Failed to {}: {}", description, e);
                Ok(BoundedOutcome::Failed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_completed_leaves_counters_alone() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let mut stats = ExplorationStats::default();

        let outcome = guard
            .run_bounded("read", &mut stats, async { Ok::<_, StoreError>(7) })
            .await;

        assert_eq!(outcome, Ok(BoundedOutcome::Completed(7)));
        assert_eq!(stats, ExplorationStats::default());
    }

    #[tokio::test]
    async fn test_timeout_is_counted_and_bounded() {
        let guard = TimeoutGuard::new(Duration::from_millis(50));
        let mut stats = ExplorationStats::default();
        let started = Instant::now();

        let outcome = guard
            .run_bounded("stall", &mut stats, async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(())
            })
            .await;

        assert_eq!(outcome, Ok(BoundedOutcome::TimedOut));
        assert_eq!(stats.timeouts, 1);
        assert_eq!(stats.errors, 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_failure_is_counted() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let mut stats = ExplorationStats::default();

        let outcome = guard
            .run_bounded("fail", &mut stats, async {
                Err::<(), _>(StoreError::other("down"))
            })
            .await;

        assert_eq!(
            outcome,
            Ok(BoundedOutcome::Failed(StoreError::other("down")))
        );
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_permission_denied_escalates_uncounted() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let mut stats = ExplorationStats::default();

        let outcome = guard
            .run_bounded("deny", &mut stats, async {
                Err::<(), _>(StoreError::permission_denied("secrets"))
            })
            .await;

        assert_eq!(
            outcome,
            Err(Escalation::PermissionDenied(StoreError::permission_denied(
                "secrets"
            )))
        );
        assert_eq!(stats, ExplorationStats::default());
    }

    #[tokio::test]
    async fn test_panicking_worker_becomes_failure() {
        let guard = TimeoutGuard::new(Duration::from_secs(1));
        let mut stats = ExplorationStats::default();

        let outcome = guard
            .run_bounded("panic", &mut stats, async {
                let exploded = true;
                if exploded {
                    panic!("worker exploded");
                }
                Ok::<(), StoreError>(())
            })
            .await;

        assert!(matches!(outcome, Ok(BoundedOutcome::Failed(_))));
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_wait() {
        let token = CancellationToken::new();
        let guard = TimeoutGuard::new(Duration::from_secs(30)).with_cancellation(token.clone());
        let mut stats = ExplorationStats::default();
        let started = Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let outcome = guard
            .run_bounded("stall", &mut stats, async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, StoreError>(())
            })
            .await;

        assert_eq!(outcome, Err(Escalation::Cancelled));
        assert_eq!(stats.timeouts, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(guard.is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_call() {
        let token = CancellationToken::new();
        token.cancel();
        let guard = TimeoutGuard::new(Duration::from_secs(1)).with_cancellation(token);
        let mut stats = ExplorationStats::default();

        let outcome = guard
            .run_bounded("read", &mut stats, async { Ok::<_, StoreError>(1) })
            .await;

        assert_eq!(outcome, Err(Escalation::Cancelled));
    }
}
