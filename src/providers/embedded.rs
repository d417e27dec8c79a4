// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded wallets reached through their SDK's internal RPC channel.
//!
//! The user authenticates with the provider client-side and hands us their
//! access token plus the id of the embedded wallet. Requests are scoped
//! either by an application id or by an environment id, depending on the
//! provider.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::rpc::{http_client, map_http_failure, parse_signature, DEFAULT_PROVIDER_TIMEOUT};
use crate::signer::{SignerError, SignerTransport};

/// How requests are scoped to the integrator's account with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedScope {
    App { app_id: String },
    Environment { environment_id: String },
}

impl EmbeddedScope {
    fn header(&self) -> (&'static str, &str) {
        match self {
            EmbeddedScope::App { app_id } => ("x-app-id", app_id.as_str()),
            EmbeddedScope::Environment { environment_id } => {
                ("x-environment-id", environment_id.as_str())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct WalletResponse {
    address: Address,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    data: RpcData,
}

#[derive(Debug, Deserialize)]
struct RpcData {
    signature: String,
}

/// Embedded wallet transport.
#[derive(Debug, Clone)]
pub struct EmbeddedWalletTransport {
    base_url: Url,
    scope: EmbeddedScope,
    wallet_id: String,
    access_token: String,
    http: Client,
}

impl EmbeddedWalletTransport {
    pub fn new(
        base_url: &str,
        scope: EmbeddedScope,
        wallet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, SignerError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            SignerError::InvalidPayload(format!("invalid provider URL `{base_url}`: {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SignerError::InvalidPayload(format!(
                "provider URL `{base_url}` cannot carry a path"
            )));
        }

        let wallet_id = wallet_id.into();
        if matches!(wallet_id.trim(), "" | "." | "..") {
            return Err(SignerError::InvalidPayload(format!(
                "invalid wallet id `{wallet_id}`"
            )));
        }

        Ok(Self {
            base_url,
            scope,
            wallet_id,
            access_token: access_token.into(),
            http: http_client(DEFAULT_PROVIDER_TIMEOUT)?,
        })
    }

    /// `{base}/v1/wallets/{wallet_id}[/rpc]`, with the wallet id escaped as a
    /// single path segment.
    fn wallet_url(&self, rpc: bool) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "wallets", self.wallet_id.as_str()]);
            if rpc {
                segments.push("rpc");
            }
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let (header, value) = self.scope.header();
        request
            .bearer_auth(&self.access_token)
            .header(header, value)
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Bytes, SignerError> {
        let response = self
            .authorize(self.http.post(self.wallet_url(true)))
            .json(&json!({ "method": method, "params": params }))
            .send()
            .await
            .map_err(|e| SignerError::Network(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_failure(status, &body));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Network(format!("{method} returned invalid JSON: {e}")))?;
        parse_signature(&body.data.signature)
    }
}

#[async_trait]
impl SignerTransport for EmbeddedWalletTransport {
    fn label(&self) -> &'static str {
        match self.scope {
            EmbeddedScope::App { .. } => "app_wallet",
            EmbeddedScope::Environment { .. } => "environment_wallet",
        }
    }

    async fn current_address(&self) -> Result<Option<Address>, SignerError> {
        let response = self
            .authorize(self.http.get(self.wallet_url(false)))
            .send()
            .await
            .map_err(|e| SignerError::Network(format!("wallet lookup failed: {e}")))?;

        match response.status().as_u16() {
            200..=299 => {
                let wallet: WalletResponse = response.json().await.map_err(|e| {
                    SignerError::Network(format!("wallet lookup returned invalid JSON: {e}"))
                })?;
                Ok(Some(wallet.address))
            }
            401 | 403 | 404 | 419 => Ok(None),
            _ => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                Err(map_http_failure(status, &body))
            }
        }
    }

    async fn personal_sign(&self, address: Address, message: &str) -> Result<Bytes, SignerError> {
        self.rpc(
            "personal_sign",
            json!({ "address": address.to_checksum(None), "message": message }),
        )
        .await
    }

    async fn sign_typed_data_v4(
        &self,
        address: Address,
        payload: &str,
    ) -> Result<Bytes, SignerError> {
        let typed_data: Value = serde_json::from_str(payload)
            .map_err(|e| SignerError::InvalidPayload(format!("typed data is not JSON: {e}")))?;
        self.rpc(
            "eth_signTypedData_v4",
            json!({ "address": address.to_checksum(None), "typed_data": typed_data }),
        )
        .await
    }
}
