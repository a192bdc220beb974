use anyhow::Result;
use tokio_util::sync::CancellationToken;

/// Resolves with the name of the first shutdown signal received.
pub async fn wait_for_shutdown() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        Ok(name)
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c().await?;
        Ok("ctrl-c")
    }
}

/// Cancel `token` once the process is asked to stop.
///
/// Runs on a spawned task so the caller can go on serving.
pub fn cancel_on_shutdown(token: CancellationToken) {
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => tracing::info!(signal, "shutdown requested"),
            Err(e) => {
                // Handler registration failed; Ctrl+C is still available.
                tracing::warn!(error = %e, "signal handlers unavailable; waiting for ctrl-c");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "ctrl-c handler failed; shutting down");
                }
            }
        }
        token.cancel();
    });
}
