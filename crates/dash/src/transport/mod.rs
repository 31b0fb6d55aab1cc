// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport for the dashboard.

pub mod auth;
pub mod pages;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all dashboard routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Liveness (no session)
        .route("/healthz", get(pages::healthz))
        // Pages
        .route("/", get(pages::index))
        .route("/dashboard", get(pages::dashboard))
        // Login flow
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/settings", get(auth::settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
