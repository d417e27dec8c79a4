// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for session-scoped routes.
//!
//! Every `/v1/sessions/{address}/...` route needs the access token returned
//! when the session was created:
//!
//! ```rust,ignore
//! async fn my_handler(SessionAuth(session): SessionAuth) -> impl IntoResponse {
//!     // session is the caller's own WalletSession
//! }
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use super::parse_address;
use crate::{error::ApiError, session::WalletSession, state::AppState};

/// Machine-readable code for a missing or wrong access token.
pub const UNAUTHORIZED_CODE: &str = "session_unauthorized";

/// Read the bearer token, if the request carries one.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| {
            ApiError::unauthorized(
                "Invalid authorization header format (expected 'Bearer <token>')",
            )
            .with_code(UNAUTHORIZED_CODE)
        })
}

/// The session named by the `{address}` path segment, after checking the
/// caller's bearer token against it.
pub struct SessionAuth(pub Arc<WalletSession>);

impl FromRequestParts<AppState> for SessionAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(address) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        let address = parse_address(&address)?;

        let token = bearer_token(&parts.headers)?.ok_or_else(|| {
            ApiError::unauthorized("Missing session access token").with_code(UNAUTHORIZED_CODE)
        })?;

        let session = state.sessions.require(address).await?;
        if !session.authorizes(token) {
            return Err(ApiError::unauthorized("Invalid session access token")
                .with_code(UNAUTHORIZED_CODE));
        }

        Ok(SessionAuth(session))
    }
}
