// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard pages. Markup is minimal; the rendering layer is not what
//! this service is about.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Serialize;

use crate::state::AppState;
use crate::transport::auth::{require_session, session_cookie};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub session_count: usize,
}

/// `GET /healthz`
pub async fn healthz(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "running".to_owned(),
        session_count: s.sessions.count().await,
    })
}

/// `GET /`
pub async fn index() -> Redirect {
    Redirect::to("/dashboard")
}

/// `GET /dashboard` — greet the user and list their manageable guilds.
pub async fn dashboard(State(s): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let handle = match require_session(&s, &headers, "/dashboard").await {
        Ok(handle) => handle,
        Err(redirect) => return redirect.into_response(),
    };

    let claims = match handle.claims().await {
        Ok(claims) => claims,
        Err(e) => {
            // Malformed token: same outcome as a failed refresh — the
            // session is dropped and the user goes back through login.
            tracing::warn!(err = %e, "session token malformed, forcing re-login");
            if let Some(sid) = session_cookie(&headers) {
                s.sessions.remove(&sid).await;
            }
            return Redirect::to("/auth/login?redirect=/dashboard").into_response();
        }
    };

    let name = claims.name().map(escape_html).unwrap_or_else(|| "there".to_owned());
    let avatar = claims
        .picture()
        .map(|url| format!(r#"<img src="{}" alt="avatar" width="35" height="35">"#, escape_html(url)))
        .unwrap_or_default();

    // Guild info is best-effort: the page renders without it.
    let guild_section = match handle.user_info(&s.http, &s.config.info_url).await {
        Ok(info) => {
            let items: String = info
                .get("discord-guilds")
                .and_then(|v| v.as_array())
                .map(|guilds| {
                    guilds
                        .iter()
                        .filter_map(|g| g.get("name").and_then(|n| n.as_str()))
                        .map(|name| format!("<li>{}</li>", escape_html(name)))
                        .collect()
                })
                .unwrap_or_default();
            if items.is_empty() {
                "<p>You don't have any servers you're able to manage.</p>".to_owned()
            } else {
                format!("<ul>{items}</ul>")
            }
        }
        Err(e) => {
            tracing::debug!(err = %e, "user info unavailable");
            String::new()
        }
    };

    Html(format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>ticketdash</title></head><body>\
         <header>{avatar} <a href=\"/auth/logout\">Logout</a></header>\
         <main><h1>Welcome, {name}!</h1>\
         <p>Select a server below to manage its ticket panels.</p>\
         {guild_section}</main>\
         </body></html>",
    ))
    .into_response()
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
