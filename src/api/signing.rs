// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signing through the session's signer adapter.

use axum::{extract::State, Json};

use super::{auth::SessionAuth, signer_failure};
use crate::{
    error::ApiError,
    models::{SignMessageRequest, SignTypedDataRequest, SignatureResponse},
    signer::TypedDataPayload,
    state::AppState,
};

/// Sign a text or hex message with `personal_sign`.
#[utoipa::path(
    post,
    path = "/v1/sessions/{address}/sign/message",
    tag = "Signing",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    request_body = SignMessageRequest,
    responses(
        (status = 200, description = "Signature", body = SignatureResponse),
        (status = 401, description = "Wallet session expired, or missing or invalid access token"),
        (status = 404, description = "No session for this address"),
        (status = 409, description = "User rejected the request"),
        (status = 422, description = "Message is not valid hex")
    )
)]
pub async fn sign_message(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
    Json(request): Json<SignMessageRequest>,
) -> Result<Json<SignatureResponse>, ApiError> {
    let message = request.into_message()?;

    let signature = match session.signer().sign_message(message).await {
        Ok(signature) => signature,
        Err(e) => return Err(signer_failure(&state, &session, e).await),
    };

    Ok(Json(SignatureResponse {
        address: session.address().to_checksum(None),
        signature,
    }))
}

/// Sign EIP-712 typed data with `eth_signTypedData_v4`.
#[utoipa::path(
    post,
    path = "/v1/sessions/{address}/sign/typed-data",
    tag = "Signing",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    request_body = SignTypedDataRequest,
    responses(
        (status = 200, description = "Signature", body = SignatureResponse),
        (status = 401, description = "Wallet session expired, or missing or invalid access token"),
        (status = 404, description = "No session for this address"),
        (status = 409, description = "User rejected the request"),
        (status = 422, description = "Malformed typed data")
    )
)]
pub async fn sign_typed_data(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
    Json(request): Json<SignTypedDataRequest>,
) -> Result<Json<SignatureResponse>, ApiError> {
    let payload = TypedDataPayload::try_from(request)?;

    let signature = match session.signer().sign_typed_data(&payload).await {
        Ok(signature) => signature,
        Err(e) => return Err(signer_failure(&state, &session, e).await),
    };

    Ok(Json(SignatureResponse {
        address: session.address().to_checksum(None),
        signature,
    }))
}
