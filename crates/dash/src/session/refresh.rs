// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoint exchanges: refresh and authorization-code grants.

use serde::Deserialize;

/// Token bundle returned by the provider's token endpoint.
///
/// Unknown fields are ignored. Missing required fields fail
/// deserialization, which callers treat as a failed exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Access token lifetime in seconds, relative to the response.
    pub expires_in: u64,
    /// Part of the bundle; not used for expiry arithmetic here.
    #[serde(default)]
    pub refresh_expires_in: u64,
    pub refresh_token: String,
    /// The provider may omit this, in which case the session keeps its
    /// prior id token.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Provider token endpoint plus client credentials for exchanges.
#[derive(Debug, Clone)]
pub struct OidcClient {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Submit a `refresh_token` grant.
///
/// One attempt, no retries: a failed exchange means the caller must send
/// the user back through login.
pub async fn refresh_grant(
    http: &reqwest::Client,
    oidc: &OidcClient,
    refresh_token: &str,
) -> anyhow::Result<TokenGrant> {
    let resp = http
        .post(&oidc.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", oidc.client_id.as_str()),
            ("client_secret", oidc.client_secret.as_str()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("refresh grant failed ({status}): {text}");
    }

    let grant: TokenGrant = resp.json().await?;
    Ok(grant)
}

/// Exchange an authorization code for the initial token bundle.
pub async fn code_grant(
    http: &reqwest::Client,
    oidc: &OidcClient,
    code: &str,
    redirect_uri: &str,
) -> anyhow::Result<TokenGrant> {
    let resp = http
        .post(&oidc.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", oidc.client_id.as_str()),
            ("client_secret", oidc.client_secret.as_str()),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("code exchange failed ({status}): {text}");
    }

    let grant: TokenGrant = resp.json().await?;
    Ok(grant)
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
