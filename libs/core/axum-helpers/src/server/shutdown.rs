use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Two-phase shutdown shared by the server and every request.
///
/// 1. [`ShutdownCoordinator::shutdown`] starts draining: the listener stops
///    accepting and in-flight requests keep running.
/// 2. [`ShutdownCoordinator::cancel_operations`] cancels the operations token;
///    store calls derived from it fail fast with a cancellation error.
#[derive(Clone, Debug)]
pub struct ShutdownCoordinator {
    draining: CancellationToken,
    operations: CancellationToken,
    shutdown_initiated: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            draining: CancellationToken::new(),
            operations: CancellationToken::new(),
            shutdown_initiated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Token that request-scoped operations derive their contexts from.
    pub fn operations_token(&self) -> CancellationToken {
        self.operations.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_initiated.load(Ordering::SeqCst)
    }

    /// Starts draining. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!("Initiating graceful shutdown");
            self.draining.cancel();
        }
    }

    /// Interrupts every operation still holding a context from this coordinator.
    pub fn cancel_operations(&self) {
        if !self.operations.is_cancelled() {
            warn!("Canceling in-flight operations");
            self.operations.cancel();
        }
    }

    /// Resolves once draining has started, whoever started it.
    pub async fn wait_for_shutdown(&self) {
        self.draining.cancelled().await;
    }

    /// Waits for SIGINT or SIGTERM, then starts draining.
    pub async fn wait_for_signal(&self) {
        tokio::select! {
            _ = ctrl_c() => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
            },
            _ = terminate() => {
                info!("Received SIGTERM, initiating graceful shutdown");
            },
            _ = self.wait_for_shutdown() => return,
        }

        self.shutdown();
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

async fn ctrl_c() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_releases_waiters() {
        let coordinator = ShutdownCoordinator::new();
        let waiter = coordinator.clone();
        let handle = tokio::spawn(async move { waiter.wait_for_shutdown().await });

        coordinator.shutdown();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("waiter should be released")
            .unwrap();
        assert!(coordinator.is_shutting_down());
    }

    #[tokio::test]
    async fn test_wait_for_signal_returns_after_programmatic_shutdown() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.shutdown();
        tokio::time::timeout(Duration::from_secs(1), coordinator.wait_for_signal())
            .await
            .expect("already draining");
    }

    #[test]
    fn test_draining_does_not_cancel_operations() {
        let coordinator = ShutdownCoordinator::new();
        let operation = coordinator.operations_token().child_token();

        coordinator.shutdown();
        assert!(!operation.is_cancelled());

        coordinator.cancel_operations();
        coordinator.cancel_operations();
        assert!(operation.is_cancelled());
    }
}
