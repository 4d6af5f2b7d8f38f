// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Spawns a task that cancels the returned token on the first SIGINT or
/// SIGTERM, so every service loop (`TaskerService::run`,
/// `WorkerService::run`) observes the same shutdown signal.
pub fn listen_for_shutdown() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();
    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        tokio::select! {
            _ = sigint.recv() => info!("caught SIGINT, terminating gracefully"),
            _ = sigterm.recv() => info!("caught SIGTERM, terminating gracefully"),
        }
        watched.cancel();
    });
    token
}
