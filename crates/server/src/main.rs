use std::{future::IntoFuture, time::Duration};

use anyhow::{self, Error as AnyhowError};
use deployment::{Deployment, DeploymentError};
use server::{DeploymentImpl, http};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing_subscriber::{EnvFilter, prelude::*};

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum GuildServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), GuildServerError> {
    config::load_dotenv();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},services={level},db={level},config={level},deployment={level},local_deployment={level},utils={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string)
        .map_err(|err| anyhow::anyhow!("Failed to create tracing filter: {err}"))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let deployment = DeploymentImpl::new().await?;
    let app_router = http::router(deployment.clone());

    let bind_address = deployment.config().bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        company_cut = deployment.config().company_cut,
        "Server running on http://{local_addr}"
    );

    let (signalled_tx, signalled_rx) = oneshot::channel();
    let server = axum::serve(listener, app_router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, draining in-flight requests");
            let _ = signalled_tx.send(());
        })
        .into_future();

    let serve_result = tokio::select! {
        res = server => res,
        _ = drain_deadline(signalled_rx, GRACEFUL_SHUTDOWN_TIMEOUT) => {
            tracing::warn!(
                timeout = ?GRACEFUL_SHUTDOWN_TIMEOUT,
                "Requests still in flight after shutdown deadline, exiting"
            );
            std::process::exit(130);
        }
    };

    serve_result?;

    if let Err(err) = deployment.db().pool.clone().close().await {
        tracing::warn!("Failed to close database pool: {err}");
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix. A handler that fails to install
/// never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Completes `timeout` after the shutdown signal fires. Pending forever if the
/// server stops without one.
async fn drain_deadline(signalled: oneshot::Receiver<()>, timeout: Duration) {
    if signalled.await.is_err() {
        std::future::pending::<()>().await;
    }
    tokio::time::sleep(timeout).await;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::drain_deadline;

    #[tokio::test]
    async fn drain_deadline_waits_for_the_signal() {
        let (tx, rx) = oneshot::channel();
        let deadline = drain_deadline(rx, Duration::from_millis(10));
        tokio::pin!(deadline);

        let early = tokio::time::timeout(Duration::from_millis(50), &mut deadline).await;
        assert!(early.is_err());

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(1), deadline)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn drain_deadline_never_fires_without_a_signal() {
        let (tx, rx) = oneshot::channel::<()>();
        drop(tx);

        let fired = tokio::time::timeout(
            Duration::from_millis(50),
            drain_deadline(rx, Duration::from_millis(1)),
        )
        .await;
        assert!(fired.is_err());
    }
}
