// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::config::DashConfig;
use crate::session::refresh::OidcClient;
use crate::session::store::SessionStore;

/// A started login waiting for its callback.
pub struct PendingLogin {
    /// Site-relative page to land on after the callback.
    pub target: String,
    /// Epoch seconds when the login started. Entries past the login TTL
    /// are rejected by the callback and purged as new logins start.
    pub issued_at: u64,
}

/// Shared dashboard state.
pub struct AppState {
    pub config: DashConfig,
    /// One outbound client for all sessions; stateless and safe to share.
    /// The timeout bounds every token exchange — a timed-out refresh is a
    /// failed refresh.
    pub http: reqwest::Client,
    pub sessions: SessionStore,
    /// Pending logins keyed by the OAuth `state` parameter.
    pub pending_logins: RwLock<HashMap<String, PendingLogin>>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: DashConfig, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            config,
            http,
            sessions: SessionStore::new(),
            pending_logins: RwLock::new(HashMap::new()),
            shutdown,
        })
    }

    pub fn oidc(&self) -> OidcClient {
        self.config.oidc_client()
    }
}
