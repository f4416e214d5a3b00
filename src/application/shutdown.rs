//! Operator shutdown signal

use tokio::signal;

/// Create a future that completes when a shutdown signal is received
///
/// Listens for Ctrl+C everywhere and SIGTERM on unix. If a handler cannot be
/// installed that source is ignored.
///
/// # Example
///
/// ```rust,ignore
/// use featurekit::application::{Application, shutdown_signal};
///
/// let mut app = Application::builder().with_default_features().build()?;
/// app.run_until(shutdown_signal()).await?;
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
