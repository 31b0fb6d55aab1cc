// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access-token claim extraction.
//!
//! The payload segment is decoded and parsed, never verified: the token was
//! handed to this process directly by the identity provider over the token
//! endpoint, so there is no third party to distrust. Do not add signature
//! verification here — the refresh flow carries no key material for it and
//! the trust boundary is intentional.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};

/// The access token is not well-formed three-part compact serialization, or
/// its payload segment is not valid base64url / UTF-8 / JSON.
///
/// Callers must treat this as "session unusable" (same outcome as a failed
/// refresh), never as "no claims present".
#[derive(Debug, thiserror::Error)]
pub enum MalformedToken {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),
    #[error("payload segment is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload segment is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload decodes to a non-object JSON value")]
    NotAnObject,
}

/// Claims decoded from an access token's payload segment.
#[derive(Debug, Clone)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Decode the payload (middle) segment of a compact three-part token.
    pub fn from_compact(token: &str) -> Result<Self, MalformedToken> {
        let segments: Vec<&str> = token.split('.').collect();
        if segments.len() != 3 {
            return Err(MalformedToken::SegmentCount(segments.len()));
        }

        // Providers differ on padding; the no-pad engine rejects `=`, so
        // strip any trailing padding before decoding.
        let payload = segments[1].trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD.decode(payload)?;

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(MalformedToken::NotAnObject),
        }
    }

    /// Display name (`preferred_username`), if the provider supplied one.
    pub fn name(&self) -> Option<&str> {
        self.0.get("preferred_username").and_then(Value::as_str)
    }

    /// Profile picture URL (`picture`), if the provider supplied one.
    pub fn picture(&self) -> Option<&str> {
        self.0.get("picture").and_then(Value::as_str)
    }

    /// Permission list. `None` means the claim is absent (unknown), which
    /// callers must treat differently from an empty list.
    pub fn permissions(&self) -> Option<Vec<&str>> {
        let list = self.0.get("permissions")?.as_array()?;
        Some(list.iter().filter_map(Value::as_str).collect())
    }

    /// Raw claim lookup for anything beyond the typed accessors.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

#[cfg(test)]
#[path = "claims_tests.rs"]
mod tests;
