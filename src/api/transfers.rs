// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Batch transfer endpoints.
//!
//! A transfer is two calls: `quote` prices the batch and stores the quote in
//! the session, `execute` signs the stored quote and waits for the batch
//! receipt.

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::info;

use super::{auth::SessionAuth, signer_failure};
use crate::{
    blockchain::parse_amount,
    error::ApiError,
    execution::ExecutionError,
    models::{ExecuteResponse, QuoteResponse, TransferQuoteRequest},
    session::PendingTransfer,
    state::AppState,
    transfer::{parse_recipients, quote_transfer},
};

/// Quote a batch transfer.
///
/// Sends `amount` of the configured transfer token to each recipient. The
/// funding trigger pulls `recipients × amount` from the wallet. The quote is
/// kept in the session until executed or replaced.
#[utoipa::path(
    post,
    path = "/v1/sessions/{address}/transfers/quote",
    tag = "Transfers",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    request_body = TransferQuoteRequest,
    responses(
        (status = 200, description = "Quote", body = QuoteResponse),
        (status = 400, description = "Invalid recipients or amount"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 404, description = "No session for this address"),
        (status = 502, description = "Execution service error"),
        (status = 503, description = "Execution service not configured")
    )
)]
pub async fn quote(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
    Json(request): Json<TransferQuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let client = state.execution()?;

    let decimals = state.config.chain.transfer_token.decimals;
    let recipients = parse_recipients(request.recipients.as_slice())?;
    let amount = parse_amount(&request.amount, decimals)?;

    let (quote_request, quote) = quote_transfer(
        client.as_ref(),
        session.account(),
        &state.transfer_settings(),
        &recipients,
        amount,
    )
    .await?;

    let pending = PendingTransfer {
        quote,
        recipients,
        amount,
        total: quote_request.funding_trigger.amount,
        quoted_at: Utc::now(),
    };
    session.store_pending(pending.clone()).await;

    Ok(Json(QuoteResponse::from_pending(&pending, decimals)))
}

/// Execute the stored quote.
///
/// Asks the wallet to sign the quote hash, submits it, and waits for the
/// batch to reach a terminal status. A rejected or failed submission keeps
/// the quote for another attempt.
#[utoipa::path(
    post,
    path = "/v1/sessions/{address}/transfers/execute",
    tag = "Transfers",
    security(("bearer_auth" = [])),
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Batch confirmed", body = ExecuteResponse),
        (status = 401, description = "Wallet session expired, or missing or invalid access token"),
        (status = 404, description = "No session for this address"),
        (status = 409, description = "No pending quote, or the user rejected the signature"),
        (status = 502, description = "Execution service error or batch failed"),
        (status = 503, description = "Execution service not configured"),
        (status = 504, description = "Receipt wait timed out")
    )
)]
pub async fn execute(
    State(state): State<AppState>,
    SessionAuth(session): SessionAuth,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let client = state.execution()?;

    let pending = session
        .take_pending()
        .await
        .ok_or_else(|| ApiError::conflict("No quote to execute, request a quote first"))?;

    let handle = match client.execute_quote(session.account(), &pending.quote).await {
        Ok(handle) => handle,
        Err(ExecutionError::Signer(e)) => {
            session.restore_pending(pending).await;
            return Err(signer_failure(&state, &session, e).await);
        }
        Err(e) => {
            session.restore_pending(pending).await;
            return Err(e.into());
        }
    };

    let receipt = client.wait_for_receipt(&handle).await?;
    info!(
        address = %session.address(),
        quote_hash = %pending.quote.hash,
        batch_hash = %receipt.hash,
        recipients = pending.recipients.len(),
        "Batch transfer confirmed"
    );

    Ok(Json(ExecuteResponse::from_receipt(
        pending.quote.hash.to_string(),
        &receipt,
    )))
}
