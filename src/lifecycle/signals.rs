//! OS signal handling.

/// Resolve once Ctrl+C is received.
///
/// If the handler cannot be installed the error is logged and the future
/// never resolves, leaving other shutdown paths in charge.
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
