//! Deadlines and cancellation for store operations.
//!
//! Every repository call takes an [`OperationContext`]. The context races the
//! driver future against its cancellation token and optional deadline, so a
//! canceled or expired call returns an error instead of a partial result.
//! Dropping the driver future aborts the in-flight operation.

use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why an operation stopped before the store answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("operation canceled")]
    Canceled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Caller-supplied deadline and cancellation token for one logical operation.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl OperationContext {
    /// A context that never expires and is only canceled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Derives a context canceled together with `self`, expiring no later than
    /// either `self`'s deadline or `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        let deadline = match self.deadline {
            Some(parent) if parent < candidate => parent,
            _ => candidate,
        };

        Self {
            deadline: Some(deadline),
            token: self.token.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails fast when the context is already canceled or past its deadline.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.token.is_cancelled() {
            return Err(ContextError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drives `operation` to completion unless the context ends first.
    ///
    /// Cancellation wins over completion when both are ready.
    pub async fn run<F>(&self, operation: F) -> Result<F::Output, ContextError>
    where
        F: IntoFuture,
    {
        self.check()?;
        let operation = operation.into_future();

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(ContextError::Canceled),
                    output = tokio::time::timeout_at(deadline, operation) => {
                        output.map_err(|_| ContextError::DeadlineExceeded)
                    }
                }
            }
            None => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Err(ContextError::Canceled),
                    output = operation => Ok(output),
                }
            }
        }
    }
}

/// Mints one [`OperationContext`] per inbound request.
///
/// Every context gets the configured per-call timeout and is a child of the
/// process shutdown token, so canceling that token interrupts all in-flight
/// store calls.
#[derive(Debug, Clone)]
pub struct OperationScope {
    timeout: Duration,
    shutdown: CancellationToken,
}

impl OperationScope {
    pub fn new(timeout: Duration, shutdown: CancellationToken) -> Self {
        Self { timeout, shutdown }
    }

    pub fn begin(&self) -> OperationContext {
        OperationContext {
            deadline: Some(Instant::now() + self.timeout),
            token: self.shutdown.child_token(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
