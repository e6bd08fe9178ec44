// SPDX-FileCopyrightText: 2026 Vestibule Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `vestibule serve` command implementation.
//!
//! Opens the SQLite database, wires the shared application state, and runs
//! the axum server until SIGINT or SIGTERM.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vestibule_config::VestibuleConfig;
use vestibule_core::VestibuleError;
use vestibule_server::{start_server, AppState};
use vestibule_storage::Database;

/// Runs the `vestibule serve` command.
pub async fn run_serve(config: VestibuleConfig) -> Result<(), VestibuleError> {
    init_tracing(&config.server.log_level);

    info!("starting vestibule serve");

    let db = Database::open_with_wal(&config.storage.database_path, config.storage.wal_mode)
        .await?;
    info!(path = %config.storage.database_path, "database ready");

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::new(db, config);

    let cancel = install_signal_handler();
    tokio::select! {
        result = start_server(&host, port, state) => result,
        _ = cancel.cancelled() => {
            info!("vestibule serve shutdown complete");
            Ok(())
        }
    }
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    debug!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vestibule={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
