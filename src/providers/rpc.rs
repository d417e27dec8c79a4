// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared plumbing for provider transports: a JSON-RPC 2.0 channel and the
//! mapping of provider failures onto [`SignerError`].

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::Bytes;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use crate::signer::SignerError;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED: i64 = 4001;
/// EIP-1193: the requested method/account is not authorized.
pub const UNAUTHORIZED: i64 = 4100;
/// EIP-1193: the provider does not support the method.
pub const UNSUPPORTED_METHOD: i64 = 4200;
/// EIP-1193: the provider is disconnected from all chains.
pub const DISCONNECTED: i64 = 4900;
/// EIP-3326: the chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// JSON-RPC: method not found.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Default timeout for provider HTTP calls. Signing requests may wait on a
/// human, so this is generous.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Build the HTTP client used by every provider transport.
pub fn http_client(timeout: Duration) -> Result<Client, SignerError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SignerError::Network(format!("failed to build HTTP client: {e}")))
}

/// Map a JSON-RPC error object to the signer taxonomy.
pub fn map_rpc_error(method: &str, error: RpcErrorObject) -> SignerError {
    match error.code {
        USER_REJECTED => SignerError::SigningRejected(error.message),
        UNAUTHORIZED | DISCONNECTED => SignerError::SessionExpired(error.message),
        code => SignerError::Provider {
            code,
            message: format!("{method}: {}", error.message),
        },
    }
}

/// Map a non-success HTTP response to the signer taxonomy.
pub fn map_http_failure(status: StatusCode, body: &str) -> SignerError {
    let rejected = body.to_ascii_lowercase().contains("reject");
    match status.as_u16() {
        401 | 419 => SignerError::SessionExpired(format!("provider returned {status}: {body}")),
        403 | 409 if rejected => SignerError::SigningRejected(body.to_string()),
        403 => SignerError::SessionExpired(format!("provider returned {status}: {body}")),
        _ => SignerError::Network(format!("provider returned {status}: {body}")),
    }
}

/// Parse a hex signature string returned by a provider.
pub fn parse_signature(raw: &str) -> Result<Bytes, SignerError> {
    Bytes::from_str(raw.trim())
        .map_err(|e| SignerError::Provider {
            code: 0,
            message: format!("provider returned a malformed signature: {e}"),
        })
        .and_then(|bytes| {
            if bytes.is_empty() {
                Err(SignerError::Provider {
                    code: 0,
                    message: "provider returned an empty signature".to_string(),
                })
            } else {
                Ok(bytes)
            }
        })
}

/// Minimal JSON-RPC 2.0 client over HTTP.
#[derive(Debug)]
pub struct JsonRpcChannel {
    url: String,
    http: Client,
    next_id: AtomicU64,
}

impl JsonRpcChannel {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SignerError> {
        let url = url.into();
        url::Url::parse(&url)
            .map_err(|e| SignerError::InvalidPayload(format!("invalid provider URL `{url}`: {e}")))?;

        Ok(Self {
            url,
            http: http_client(timeout)?,
            next_id: AtomicU64::new(1),
        })
    }

    /// Call `method` and deserialize its result. A `null` result is handed
    /// to `T` as-is, so `Option<_>` or `Value` accept it.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, SignerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| SignerError::Network(format!("{method} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_http_failure(status, &body));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| SignerError::Network(format!("{method} returned invalid JSON: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(map_rpc_error(method, error));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null)).map_err(|e| {
            SignerError::Provider {
                code: 0,
                message: format!("{method} returned an unexpected result: {e}"),
            }
        })
    }
}
