// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet session endpoints.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use super::auth::{bearer_token, SessionAuth};
use crate::{
    error::ApiError,
    models::{BalanceResponse, QuoteResponse, SessionResponse},
    providers::{build_transport, ProviderCredentials},
    session::WalletSession,
    state::AppState,
};

pub(crate) async fn session_response(
    state: &AppState,
    session: &WalletSession,
    created: bool,
) -> SessionResponse {
    let pending_quote = session.pending().await.map(|pending| {
        QuoteResponse::from_pending(&pending, state.config.chain.transfer_token.decimals)
    });

    SessionResponse {
        session_id: session.id(),
        provider: session.provider(),
        address: session.address().to_checksum(None),
        chain_ids: session
            .account()
            .deployments()
            .iter()
            .map(|d| d.network.chain_id)
            .collect(),
        account_version: state.config.chain.account_version.clone(),
        created_at: session.created_at(),
        created,
        access_token: created.then(|| session.access_token().to_string()),
        pending_quote,
    }
}

/// Connect a wallet provider.
///
/// Reads the provider's authenticated address and sets up the orchestrator
/// account for it. The response to a new session carries its `access_token`,
/// which every other session route expects as a bearer token.
///
/// Connecting an address that already has a session returns that session
/// with `200` when the request carries its access token, and `409` otherwise.
#[utoipa::path(
    post,
    path = "/v1/sessions",
    tag = "Sessions",
    request_body = ProviderCredentials,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 200, description = "Existing session returned", body = SessionResponse),
        (status = 400, description = "Missing credential"),
        (status = 401, description = "Provider has no authenticated wallet"),
        (status = 409, description = "User rejected the chain switch, or the address already has a session"),
        (status = 502, description = "Provider unreachable"),
        (status = 503, description = "Provider or chain not configured")
    )
)]
pub async fn connect_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(credentials): Json<ProviderCredentials>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let token = bearer_token(&headers)?;
    let setup = state.session_setup()?;
    let transport = build_transport(&state.config.providers, &credentials)?;

    let (session, created) = state
        .sessions
        .connect(credentials.kind(), transport, setup)
        .await?;

    if !created && !token.is_some_and(|t| session.authorizes(t)) {
        return Err(ApiError::conflict(
            "Address already has a session, present its access token or disconnect it first",
        ));
    }

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(session_response(&state, &session, created).await)))
}

/// Get a session.
#[utoipa::path(
    get,
    path = "/v1/sessions/{address}",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Session", body = SessionResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No session for this address")
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(session_response(&state, &session, false).await))
}

/// Disconnect a session and stop its balance polling.
#[utoipa::path(
    delete,
    path = "/v1/sessions/{address}",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No session for this address")
    )
)]
pub async fn disconnect_session(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
) -> Result<StatusCode, ApiError> {
    state.sessions.disconnect(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Last known balances.
///
/// Balances are refreshed in the background; a failed refresh keeps the
/// previous values and sets `last_error`.
#[utoipa::path(
    get,
    path = "/v1/sessions/{address}/balance",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Balances", body = BalanceResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No session for this address")
    )
)]
pub async fn get_balance(
    SessionAuth(session): SessionAuth,
) -> Result<Json<BalanceResponse>, ApiError> {
    Ok(Json(BalanceResponse {
        address: session.address().to_checksum(None),
        balances: session.balances().await,
    }))
}
