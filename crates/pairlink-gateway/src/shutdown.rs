//! Graceful shutdown.
//!
//! On a termination signal the gateway:
//!
//! 1. closes the readiness gate so new sends get 503,
//! 2. stops accepting connections and drains in-flight requests,
//! 3. destroys the messaging session.
//!
//! The whole sequence runs under a single watchdog budget. Overrunning it
//! reports [`ShutdownOutcome::TimedOut`] and the process exits non-zero.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use pairlink_session::{SessionConnector, SessionSupervisor};

/// How a served gateway came to a stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Drained and destroyed within budget.
    Graceful,
    /// The watchdog fired before the sequence finished.
    TimedOut,
    /// The HTTP server itself failed.
    Failed(String),
}

impl ShutdownOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Graceful => 0,
            Self::TimedOut | Self::Failed(_) => 1,
        }
    }
}

/// Serves the router and runs the shutdown sequence once `signal` resolves.
pub struct ShutdownOrchestrator<C>
where
    C: SessionConnector,
{
    session: Arc<SessionSupervisor<C>>,
    budget: Duration,
}

impl<C> ShutdownOrchestrator<C>
where
    C: SessionConnector + 'static,
{
    /// Create an orchestrator with the given watchdog budget.
    #[must_use]
    pub fn new(session: Arc<SessionSupervisor<C>>, budget: Duration) -> Self {
        Self { session, budget }
    }

    /// Serve `app` on `listener` until `signal` resolves, then shut down.
    ///
    /// A failure to destroy the session is logged and does not change the
    /// outcome.
    pub async fn serve<F>(self, listener: TcpListener, app: Router, signal: F) -> ShutdownOutcome
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (signalled_tx, mut signalled_rx) = watch::channel(false);

        let session = Arc::clone(&self.session);
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            signal.await;
            tracing::info!("Shutdown signal received, draining in-flight requests");
            session.begin_shutdown();
            signalled_tx.send_replace(true);
        });

        let session = Arc::clone(&self.session);
        let drain = async move {
            let served = server.await;
            match &served {
                Ok(()) => tracing::info!("HTTP server closed"),
                Err(e) => tracing::error!(error = %e, "HTTP server failed"),
            }

            match session.shutdown().await {
                Ok(()) => tracing::info!("Messaging session destroyed"),
                Err(e) => tracing::error!(error = %e, "Error destroying messaging session"),
            }

            served
        };
        tokio::pin!(drain);

        // The budget starts when the signal arrives, not when serving starts.
        tokio::select! {
            served = &mut drain => return outcome_of(served),
            _ = signalled_rx.changed() => {}
        }

        if let Ok(served) = tokio::time::timeout(self.budget, &mut drain).await {
            outcome_of(served)
        } else {
            tracing::error!(
                budget = ?self.budget,
                "Could not finish shutdown in time, forcing exit"
            );
            ShutdownOutcome::TimedOut
        }
    }
}

fn outcome_of(served: std::io::Result<()>) -> ShutdownOutcome {
    match served {
        Ok(()) => ShutdownOutcome::Graceful,
        Err(e) => ShutdownOutcome::Failed(e.to_string()),
    }
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
