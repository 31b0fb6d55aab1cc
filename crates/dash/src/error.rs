// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Failures the dashboard reports to the browser as JSON.
///
/// The variants are exactly the outcomes the login flow can produce;
/// everything else on this surface is a redirect, not an error page.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    /// The callback request is not a login this server started.
    #[error("{0}")]
    BadRequest(String),
    /// The identity provider rejected or failed an exchange.
    #[error("{0}")]
    Upstream(String),
}

impl DashError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Upstream(_) => "UPSTREAM_ERROR",
        }
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody { code: self.code().to_owned(), message: self.to_string() },
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
