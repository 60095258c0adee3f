use tracing::{info, warn};

use vuload::shutdown::ShutdownSender;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Broadcasts a shutdown on Ctrl+C or SIGTERM. The task ends on its own once
/// any shutdown has been sent.
pub fn setup_signal_shutdown_handler(shutdown_tx: &ShutdownSender) -> tokio::task::JoinHandle<()> {
    let shutdown_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();

        #[cfg(unix)]
        let mut term_signal = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!("Failed to register SIGTERM handler: {}", err);
                None
            }
        };

        #[cfg(unix)]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, draining in-flight requests.");
                    drop(shutdown_tx.send(()));
                }
                () = async {
                    if let Some(signal) = term_signal.as_mut() {
                        signal.recv().await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                } => {
                    info!("SIGTERM received, draining in-flight requests.");
                    drop(shutdown_tx.send(()));
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = shutdown_rx.recv() => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupt received, draining in-flight requests.");
                    drop(shutdown_tx.send(()));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use vuload::shutdown::shutdown_channel;

    use super::*;

    const SIGNAL_HANDLER_SETTLE: Duration = Duration::from_millis(10);
    const SHUTDOWN_HANDLER_TIMEOUT: Duration = Duration::from_secs(1);

    #[tokio::test(flavor = "current_thread")]
    async fn signal_handler_exits_on_shutdown() -> Result<(), String> {
        let (shutdown_tx, _) = shutdown_channel();
        let handle = setup_signal_shutdown_handler(&shutdown_tx);

        tokio::time::sleep(SIGNAL_HANDLER_SETTLE).await;
        if shutdown_tx.send(()).is_err() {
            return Err("Failed to send shutdown".to_owned());
        }

        tokio::time::timeout(SHUTDOWN_HANDLER_TIMEOUT, handle)
            .await
            .map_err(|err| format!("Timed out waiting for shutdown handler: {}", err))?
            .map_err(|err| format!("Shutdown task join error: {}", err))?;
        Ok(())
    }
}
