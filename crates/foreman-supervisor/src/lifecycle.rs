//! Application-level shutdown coordination.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::supervisor::Supervisor;

/// Runs the application's shutdown sequence exactly once.
///
/// Shutdown can be triggered from several places at once (a termination
/// signal, a window-close hook, an explicit quit action); the coordinator
/// lets every trigger call [`shutdown`](Self::shutdown) and guarantees the
/// stop-and-release body runs a single time.
pub struct LifecycleCoordinator {
    supervisor: Arc<Supervisor>,
    done: AtomicBool,
}

impl LifecycleCoordinator {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self {
            supervisor,
            done: AtomicBool::new(false),
        }
    }

    pub fn supervisor(&self) -> &Arc<Supervisor> {
        &self.supervisor
    }

    /// Run the shutdown sequence: refuse new starts, gracefully stop every
    /// process, then release background resources.
    ///
    /// Returns `true` for the one call that performed the sequence and
    /// `false` for every other. Losers return immediately, they do not wait
    /// for the winner to finish.
    pub async fn shutdown(&self) -> bool {
        if self
            .done
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("shutdown already performed, ignoring trigger");
            return false;
        }

        info!("shutting down: stopping all supervised processes");
        self.supervisor.cancellation_token().cancel();
        self.supervisor.stop_all().await;
        self.supervisor.release_resources().await;
        info!("shutdown complete");
        true
    }

    pub fn is_shut_down(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }
}

/// Wait until the host receives a termination request from the OS.
///
/// SIGINT or SIGTERM on Unix, Ctrl-C elsewhere. Returns normally so the
/// caller decides what shutdown means; the process is never exited from
/// here.
pub async fn wait_for_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint =
            signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ProcessRegistry;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn shutdown_runs_once() {
        let supervisor = Arc::new(Supervisor::new(
            Arc::new(ProcessRegistry::new()),
            CancellationToken::new(),
        ));
        let coordinator = LifecycleCoordinator::new(supervisor.clone());

        assert!(!coordinator.is_shut_down());
        assert!(coordinator.shutdown().await);
        assert!(!coordinator.shutdown().await);
        assert!(coordinator.is_shut_down());
        assert!(supervisor.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn racing_triggers_elect_one_winner() {
        let supervisor = Arc::new(Supervisor::new(
            Arc::new(ProcessRegistry::new()),
            CancellationToken::new(),
        ));
        let coordinator = Arc::new(LifecycleCoordinator::new(supervisor));

        let mut triggers = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let coordinator = coordinator.clone();
            triggers.spawn(async move { coordinator.shutdown().await });
        }

        let mut winners = 0;
        while let Some(performed) = triggers.join_next().await {
            if performed.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
