//! Lifecycle: bind the listener, run the accept loop in the
//! background, block until a termination signal.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::Config;
use crate::proxy::{Listener, Router};

/// Serve until SIGINT/SIGTERM. In-flight connections are not drained:
/// returning from here (and exiting the process) ends them.
pub async fn serve(config: Config) -> Result<()> {
    let router = Arc::new(Router::from_config(&config));
    let listener = Listener::bind(&config.listen_addr, router)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;

    let accept_loop = tokio::spawn(listener.run());

    tokio::select! {
        result = shutdown_signal() => {
            result.context("failed to listen for shutdown signals")?;
            info!("shutdown signal received, exiting");
            Ok(())
        }
        result = accept_loop => match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, "accept loop failed");
                Err(e.into())
            }
            Err(e) => {
                error!(error = %e, "accept loop panicked");
                Err(e.into())
            }
        },
    }
}

async fn shutdown_signal() -> io::Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = sigterm.recv() => Ok(()),
    }
}
