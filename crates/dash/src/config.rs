// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::session::refresh::OidcClient;

/// Configuration for the ticketdash server.
///
/// Provider endpoints and client credentials are required; missing values
/// fail argument parsing at startup, never a request at runtime.
#[derive(Debug, Clone, clap::Parser)]
pub struct DashConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "TICKETDASH_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "TICKETDASH_PORT")]
    pub port: u16,

    /// Public base URL of this server, used to build OAuth redirect URIs.
    #[arg(long, default_value = "http://localhost:8080", env = "TICKETDASH_SERVER_URL")]
    pub server_url: String,

    /// Identity provider authorization endpoint.
    #[arg(long, env = "TICKETDASH_AUTH_URL")]
    pub auth_url: String,

    /// Identity provider token endpoint.
    #[arg(long, env = "TICKETDASH_TOKEN_URL")]
    pub token_url: String,

    /// Identity provider end-session (logout) endpoint.
    #[arg(long, env = "TICKETDASH_LOGOUT_URL")]
    pub logout_url: String,

    /// Identity provider account settings page, for the settings redirect.
    #[arg(long, env = "TICKETDASH_SETTINGS_URL")]
    pub settings_url: String,

    /// Identity provider additional user-info endpoint.
    #[arg(long, env = "TICKETDASH_INFO_URL")]
    pub info_url: String,

    /// OAuth client ID.
    #[arg(long, env = "TICKETDASH_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "TICKETDASH_CLIENT_SECRET")]
    pub client_secret: String,
}

impl DashConfig {
    /// Redirect URI registered with the provider.
    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.server_url.trim_end_matches('/'))
    }

    /// Post-logout landing page.
    pub fn post_logout_url(&self) -> String {
        format!("{}/", self.server_url.trim_end_matches('/'))
    }

    /// Token endpoint plus client credentials for exchanges.
    pub fn oidc_client(&self) -> OidcClient {
        OidcClient {
            token_url: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
