// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login flow: provider hand-off, callback exchange, logout, cookie
//! plumbing, and per-request session resolution.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use serde::Deserialize;

use crate::error::DashError;
use crate::session::refresh::code_grant;
use crate::session::store::SessionHandle;
use crate::session::Session;
use crate::state::{AppState, PendingLogin};

/// Cookie carrying the session id.
pub const SESSION_COOKIE: &str = "sid";

/// Scopes requested at login. `guilds` lets the provider attach the user's
/// manageable Discord guilds to the user-info response.
pub const LOGIN_SCOPES: &str = "openid profile email guilds";

/// Default landing page after login.
const DEFAULT_REDIRECT: &str = "/dashboard";

/// How long a started login may wait for its callback. Abandoned logins
/// never get one, so entries past this age are purged as new logins start.
const LOGIN_TTL_SECS: u64 = 600;

// -- State / cookie helpers ---------------------------------------------------

/// Generate a random anti-forgery `state` parameter (32 bytes, base64url).
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Extract the session id from a `Cookie` header, if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        let pair = pair.trim();
        if let Some(value) =
            pair.strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('='))
        {
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}

fn set_cookie(sid: &str) -> String {
    format!("{SESSION_COOKIE}={sid}; Path=/; HttpOnly; SameSite=Lax")
}

fn clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0")
}

/// Build the provider authorization URL for a login attempt.
pub fn build_authorize_url(
    auth_url: &str,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> String {
    format!(
        "{auth_url}?response_type=code\
         &client_id={client_id}\
         &redirect_uri={redirect_uri}\
         &scope={scope}\
         &state={state}",
        client_id = urlencode(client_id),
        redirect_uri = urlencode(redirect_uri),
        scope = urlencode(scope),
        state = urlencode(state),
    )
}

/// Resolve and validate the request's session, or say where to send the
/// user instead. A session that cannot be refreshed is dropped from the
/// store here; the session itself never deletes anything.
pub async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
    original_path: &str,
) -> Result<Arc<SessionHandle>, Redirect> {
    let login = || Redirect::to(&format!("/auth/login?redirect={}", urlencode(original_path)));

    let Some(sid) = session_cookie(headers) else {
        return Err(login());
    };
    let Some(handle) = state.sessions.get(&sid).await else {
        return Err(login());
    };

    let clock = state.sessions.clock();
    if !handle.ensure_valid(&state.http, &state.oidc(), clock).await {
        state.sessions.remove(&sid).await;
        return Err(login());
    }

    Ok(handle)
}

// -- Handlers -----------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

/// `GET /auth/login` — hand the browser to the provider's authorize URL.
pub async fn login(State(s): State<Arc<AppState>>, Query(q): Query<LoginQuery>) -> Redirect {
    let state_param = generate_state();

    // Only site-relative targets; anything else would be an open redirect.
    let target = q
        .redirect
        .filter(|t| t.starts_with('/'))
        .unwrap_or_else(|| DEFAULT_REDIRECT.to_owned());

    let now = s.sessions.clock().now_unix();
    {
        let mut pending = s.pending_logins.write().await;
        pending.retain(|_, p| now.saturating_sub(p.issued_at) <= LOGIN_TTL_SECS);
        pending.insert(state_param.clone(), PendingLogin { target, issued_at: now });
    }

    let url = build_authorize_url(
        &s.config.auth_url,
        &s.config.client_id,
        &s.config.callback_url(),
        LOGIN_SCOPES,
        &state_param,
    );
    Redirect::to(&url)
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// `GET /auth/callback` — exchange the authorization code and mint the
/// session. A session is only minted complete: a bundle without a refresh
/// token or id token rejects the login instead of creating a half-usable
/// session.
pub async fn callback(State(s): State<Arc<AppState>>, Query(q): Query<CallbackQuery>) -> Response {
    let (Some(code), Some(state_param)) = (q.code, q.state) else {
        return DashError::BadRequest("missing code or state".into()).into_response();
    };

    let now = s.sessions.clock().now_unix();
    let pending = s.pending_logins.write().await.remove(&state_param);
    let target = match pending {
        Some(p) if now.saturating_sub(p.issued_at) <= LOGIN_TTL_SECS => p.target,
        _ => {
            return DashError::BadRequest("unknown or expired login state".into()).into_response();
        }
    };

    let grant = match code_grant(&s.http, &s.oidc(), &code, &s.config.callback_url()).await {
        Ok(grant) => grant,
        Err(e) => {
            tracing::warn!(err = %e, "authorization code exchange failed");
            return DashError::Upstream("code exchange failed".into()).into_response();
        }
    };

    // `access_token`, `refresh_token`, and `expires_in` are enforced by
    // deserialization; the id token the provider sends alongside is not.
    let Some(id_token) = grant.id_token else {
        return DashError::BadRequest("no id_token in token response".into()).into_response();
    };

    let now = s.sessions.clock().now_unix();
    let session = Session {
        state: state_param,
        api_token: grant.access_token,
        id_token,
        refresh_token: grant.refresh_token,
        expires_at: now + grant.expires_in,
    };
    let sid = s.sessions.insert(session).await;

    tracing::info!("session created via login callback");
    ([(header::SET_COOKIE, set_cookie(&sid))], Redirect::to(&target)).into_response()
}

/// `GET /auth/logout` — drop the session and end it at the provider too.
pub async fn logout(State(s): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let removed = match session_cookie(&headers) {
        Some(sid) => s.sessions.remove(&sid).await,
        None => None,
    };

    let id_token_hint = removed.map(|session| session.id_token).unwrap_or_default();
    let url = format!(
        "{}?id_token_hint={}&post_logout_redirect_uri={}",
        s.config.logout_url,
        urlencode(&id_token_hint),
        urlencode(&s.config.post_logout_url()),
    );

    ([(header::SET_COOKIE, clear_cookie())], Redirect::to(&url)).into_response()
}

/// `GET /auth/settings` — hand the browser to the provider's account page.
pub async fn settings(State(s): State<Arc<AppState>>) -> Redirect {
    Redirect::to(&s.config.settings_url)
}

/// Form-style encoding for URL query parameters (spaces as `+`).
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0xf) as usize]));
            }
        }
    }
    out
}

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
