// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User session state: token fields, expiry arithmetic, lifecycle status.

pub mod claims;
pub mod refresh;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::session::claims::{Claims, MalformedToken};

/// Safety margin absorbing clock drift and request latency between a
/// validity check and the token's actual use downstream.
pub const EXPIRY_SKEW_SECS: u64 = 5;

/// One authenticated user's credential state.
///
/// Serialized field-for-field so the stored shape stays compatible with
/// whatever backs the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Anti-forgery correlation value issued at login start. Immutable for
    /// the life of the session; never reused across logins.
    pub state: String,
    /// Compact three-part access token. Replaced wholesale on refresh.
    pub api_token: String,
    /// Companion identity token. Replaced only when a refresh supplies one.
    pub id_token: String,
    /// Rotated on every successful refresh; the provider invalidates the
    /// prior value on use, so the most recent value must always be the one
    /// submitted to the token endpoint.
    pub refresh_token: String,
    /// Absolute expiry of `api_token`, epoch seconds.
    pub expires_at: u64,
}

impl Session {
    /// Whether `api_token` can still be used at `now` (epoch seconds).
    ///
    /// Strict: a token expiring exactly `EXPIRY_SKEW_SECS` from now already
    /// counts as expired.
    pub fn valid_at(&self, now: u64) -> bool {
        self.expires_at.saturating_sub(now) > EXPIRY_SKEW_SECS
    }

    /// Decode the claims embedded in `api_token`'s payload segment.
    pub fn claims(&self) -> Result<Claims, MalformedToken> {
        Claims::from_compact(&self.api_token)
    }
}

/// Derived lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Issued and still valid, never refreshed.
    Fresh,
    /// Valid after at least one successful refresh.
    Valid,
    /// Validity check fails; a refresh has not been attempted yet.
    Expired,
    /// A refresh was attempted and failed. Terminal: only a new login
    /// produces a usable session again.
    Dead,
}

/// Time source for expiry arithmetic. Injected so tests control the clock.
pub trait Clock: Send + Sync {
    /// Current epoch seconds.
    fn now_unix(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
