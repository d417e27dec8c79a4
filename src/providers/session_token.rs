// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provider authenticated by a session token.
//!
//! The integrator holds an API key; the end user's login yields a session
//! token. Every call carries both, and the provider signs with the wallet
//! attached to that session.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::rpc::{http_client, map_http_failure, parse_signature, DEFAULT_PROVIDER_TIMEOUT};
use crate::signer::{SignerError, SignerTransport};

const API_KEY_HEADER: &str = "x-api-key";
const SESSION_HEADER: &str = "x-session-token";

#[derive(Debug, Deserialize)]
struct SessionResponse {
    active: bool,
    #[serde(default)]
    wallets: Vec<SessionWallet>,
}

#[derive(Debug, Deserialize)]
struct SessionWallet {
    address: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    signature: String,
}

/// Session-token wallet transport.
#[derive(Debug, Clone)]
pub struct SessionTokenTransport {
    base_url: String,
    api_key: String,
    session_token: String,
    http: Client,
}

impl SessionTokenTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Result<Self, SignerError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            session_token: session_token.into(),
            http: http_client(DEFAULT_PROVIDER_TIMEOUT)?,
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(SESSION_HEADER, &self.session_token)
    }

    async fn sign(&self, route: &str, body: Value) -> Result<Bytes, SignerError> {
        let response = self
            .authorize(self.http.post(format!("{}{route}", self.base_url)))
            .json(&body)
            .send()
            .await
            .map_err(|e| SignerError::Network(format!("{route} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_failure(status, &body));
        }

        let body: SignatureResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Network(format!("{route} returned invalid JSON: {e}")))?;
        parse_signature(&body.signature)
    }
}

#[async_trait]
impl SignerTransport for SessionTokenTransport {
    fn label(&self) -> &'static str {
        "session_wallet"
    }

    async fn current_address(&self) -> Result<Option<Address>, SignerError> {
        let response = self
            .authorize(self.http.get(format!("{}/v1/session", self.base_url)))
            .send()
            .await
            .map_err(|e| SignerError::Network(format!("session lookup failed: {e}")))?;

        let status = response.status();
        if matches!(status.as_u16(), 401 | 419) {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_failure(status, &body));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Network(format!("session lookup returned invalid JSON: {e}")))?;

        if !session.active {
            return Ok(None);
        }

        session
            .wallets
            .into_iter()
            .find(|w| w.kind.eq_ignore_ascii_case("evm"))
            .map(|w| {
                w.address.parse::<Address>().map_err(|e| SignerError::Provider {
                    code: 0,
                    message: format!("session wallet has an invalid address: {e}"),
                })
            })
            .transpose()
    }

    async fn personal_sign(&self, address: Address, message: &str) -> Result<Bytes, SignerError> {
        self.sign(
            "/v1/sign/message",
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
        self.sign(
            "/v1/sign/typed-data",
            json!({ "address": address.to_checksum(None), "typed_data": typed_data }),
        )
        .await
    }
}
