// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ticketdash: web dashboard for configuring a Discord bot's ticket panels.
//!
//! Authenticates administrators against an OpenID Connect provider and
//! keeps their sessions usable through refresh-token rotation.

pub mod config;
pub mod error;
pub mod session;
pub mod state;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::DashConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Run the dashboard server until shutdown.
pub async fn run(config: DashConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();

    let state = Arc::new(AppState::new(config, shutdown.clone())?);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    tracing::info!("ticketdash listening on {addr}");
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
