// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry: per-session handles with single-flight refresh.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::session::claims::{Claims, MalformedToken};
use crate::session::refresh::{refresh_grant, OidcClient};
use crate::session::{Clock, Session, SessionStatus, SystemClock};

/// Failure fetching or decoding the provider's additional user info.
#[derive(Debug, thiserror::Error)]
pub enum UserInfoError {
    #[error("user info request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("user info endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("user info body is not a JSON object")]
    NotAnObject,
}

/// Live state for one session, shared across concurrent requests.
pub struct SessionHandle {
    session: RwLock<Session>,
    /// Serializes refresh exchanges. The provider rotates the refresh token
    /// on use, so two in-flight exchanges for one session would race the
    /// rotation window and the loser would force a spurious re-login.
    refresh_gate: Mutex<()>,
    dead: AtomicBool,
    refreshes: AtomicU32,
    user_info: RwLock<Option<serde_json::Value>>,
}

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self {
            session: RwLock::new(session),
            refresh_gate: Mutex::new(()),
            dead: AtomicBool::new(false),
            refreshes: AtomicU32::new(0),
            user_info: RwLock::new(None),
        }
    }

    /// Snapshot of the current field values.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Decode the claims of the current access token.
    pub async fn claims(&self) -> Result<Claims, MalformedToken> {
        let session = self.session.read().await;
        Claims::from_compact(&session.api_token)
    }

    /// Derived lifecycle status at the clock's current time.
    pub async fn status(&self, clock: &dyn Clock) -> SessionStatus {
        if self.dead.load(Ordering::Relaxed) {
            return SessionStatus::Dead;
        }
        let valid = self.session.read().await.valid_at(clock.now_unix());
        match (valid, self.refreshes.load(Ordering::Relaxed)) {
            (true, 0) => SessionStatus::Fresh,
            (true, _) => SessionStatus::Valid,
            (false, _) => SessionStatus::Expired,
        }
    }

    /// Confirm the access token is usable, refreshing it if needed.
    ///
    /// Fast path: validity holds and no I/O happens. Slow path: one refresh
    /// exchange behind the per-session gate; a caller that queued behind an
    /// in-flight exchange re-checks after acquiring the gate and adopts the
    /// winner's outcome instead of resubmitting the now-rotated refresh
    /// token. On any exchange failure the session's fields are left
    /// untouched, the session is marked dead, and `false` is returned —
    /// the caller owns what the user sees (a redirect back through login).
    pub async fn ensure_valid(
        &self,
        http: &reqwest::Client,
        oidc: &OidcClient,
        clock: &dyn Clock,
    ) -> bool {
        if self.dead.load(Ordering::Relaxed) {
            return false;
        }
        if self.session.read().await.valid_at(clock.now_unix()) {
            return true;
        }

        let _gate = self.refresh_gate.lock().await;

        // Re-check: the exchange we queued behind may have refreshed (or
        // killed) this session while we waited.
        if self.dead.load(Ordering::Relaxed) {
            return false;
        }
        if self.session.read().await.valid_at(clock.now_unix()) {
            return true;
        }

        let refresh_token = self.session.read().await.refresh_token.clone();
        match refresh_grant(http, oidc, &refresh_token).await {
            Ok(grant) => {
                let now = clock.now_unix();
                let mut session = self.session.write().await;
                session.api_token = grant.access_token;
                session.refresh_token = grant.refresh_token;
                session.expires_at = now + grant.expires_in;
                if let Some(id_token) = grant.id_token {
                    session.id_token = id_token;
                }
                drop(session);
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                tracing::debug!(err = %e, "token refresh failed, session unusable");
                self.dead.store(true, Ordering::Relaxed);
                false
            }
        }
    }

    /// Additional user info from the provider, fetched once and cached.
    ///
    /// The fetch is an explicit call with its own failure type; it never
    /// hides behind a property access.
    pub async fn user_info(
        &self,
        http: &reqwest::Client,
        info_url: &str,
    ) -> Result<serde_json::Value, UserInfoError> {
        if let Some(cached) = self.user_info.read().await.clone() {
            return Ok(cached);
        }

        let api_token = self.session.read().await.api_token.clone();
        let resp = http.post(info_url).bearer_auth(api_token).send().await?;
        if !resp.status().is_success() {
            return Err(UserInfoError::Status(resp.status()));
        }
        let value: serde_json::Value = resp.json().await?;
        if !value.is_object() {
            return Err(UserInfoError::NotAnObject);
        }

        *self.user_info.write().await = Some(value.clone());
        Ok(value)
    }
}

/// In-process registry mapping `sid` cookie values to session handles.
///
/// Sessions live only in this process's memory, so the per-handle refresh
/// gate fully serializes refreshes; a store shared across processes would
/// additionally need version-checked writes.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { sessions: RwLock::new(HashMap::new()), clock }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Store a freshly issued session, returning its new `sid`.
    pub async fn insert(&self, session: Session) -> String {
        let sid = uuid::Uuid::new_v4().to_string();
        let handle = Arc::new(SessionHandle::new(session));
        self.sessions.write().await.insert(sid.clone(), handle);
        sid
    }

    pub async fn get(&self, sid: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(sid).cloned()
    }

    /// Drop a session (logout), returning its final field values.
    pub async fn remove(&self, sid: &str) -> Option<Session> {
        let handle = self.sessions.write().await.remove(sid)?;
        Some(handle.snapshot().await)
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Validate the session behind `sid`, refreshing if required.
    pub async fn ensure_valid(
        &self,
        sid: &str,
        http: &reqwest::Client,
        oidc: &OidcClient,
    ) -> bool {
        match self.get(sid).await {
            Some(handle) => handle.ensure_valid(http, oidc, self.clock.as_ref()).await,
            None => false,
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
