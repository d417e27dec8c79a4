// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{ConfigStatusResponse, ProviderStatus};
use crate::providers::ProviderKind;
use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Connected wallet sessions
    pub sessions: usize,
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running. Missing configuration is
/// reported by `/v1/config`, not here.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: state.sessions.len().await,
    })
}

/// Configuration status panel.
///
/// Lists every provider with the keys it still needs, plus missing or
/// malformed global keys. Never fails.
#[utoipa::path(
    get,
    path = "/v1/config",
    tag = "Health",
    responses(
        (status = 200, description = "Configuration status", body = ConfigStatusResponse)
    )
)]
pub async fn config_status(State(state): State<AppState>) -> Json<ConfigStatusResponse> {
    let config = &state.config;

    let providers = ProviderKind::ALL
        .into_iter()
        .map(|kind| {
            let missing = kind.missing_keys(&config.providers);
            ProviderStatus {
                provider: kind,
                configured: missing.is_empty(),
                missing_keys: missing.into_iter().map(str::to_string).collect(),
                instructions: kind.instructions().to_string(),
            }
        })
        .collect();

    Json(ConfigStatusResponse {
        execution_ready: state.is_execution_ready(),
        chain_id: config.chain.network.chain_id,
        network: config.chain.network.name.clone(),
        account_version: config.chain.account_version.clone(),
        transfer_token: config.chain.transfer_token.address.to_checksum(None),
        transfer_token_symbol: config.chain.transfer_token.symbol.clone(),
        transfer_token_decimals: config.chain.transfer_token.decimals,
        fee_token: config.chain.fee_token.to_checksum(None),
        log_format: config.log_format,
        providers,
        issues: config.all_issues(),
    })
}
