// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Execution service client.
//!
//! The service prices a batch of instructions (quote), accepts one
//! signature over the quote hash to run it (execute), and reports progress
//! through its explorer endpoint (receipt). All of that is opaque here; this
//! client only speaks the JSON API.

use std::time::Duration;

use alloy::primitives::Bytes;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::account::OrchestratorAccount;
use super::types::*;
use crate::blockchain::erc20::transfer_calldata;
use crate::signer::{SignableMessage, SignerError};

const API_KEY_HEADER: &str = "x-api-key";

/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default upper bound on waiting for a receipt.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Execution service unreachable: {0}")]
    Network(String),

    #[error("Execution service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Execution service response was invalid: {0}")]
    InvalidResponse(String),

    #[error("Invalid execution request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("Batch {hash} failed: {reason}")]
    Failed { hash: String, reason: String },

    #[error("Batch {hash} still pending after {waited_secs}s")]
    Timeout { hash: String, waited_secs: u64 },
}

/// Encode a call descriptor into an instruction.
pub fn encode_instruction(call: &ContractCall) -> Result<Instruction, ExecutionError> {
    let data = match &call.function {
        CallFunction::Erc20Transfer { to, amount } => {
            if to.is_zero() {
                return Err(ExecutionError::InvalidRequest(
                    "transfer recipient is the zero address".to_string(),
                ));
            }
            transfer_calldata(*to, *amount)
        }
        CallFunction::Raw { data } => data.clone(),
    };

    Ok(Instruction {
        chain_id: call.chain_id,
        calls: vec![Call {
            to: call.target,
            value: call.value,
            data,
        }],
    })
}

/// Operations consumed from the execution service.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Turn a call descriptor into an instruction.
    fn build_instruction(&self, call: &ContractCall) -> Result<Instruction, ExecutionError> {
        encode_instruction(call)
    }

    /// Price a batch for `account`.
    async fn get_quote(
        &self,
        account: &OrchestratorAccount,
        request: &QuoteRequest,
    ) -> Result<Quote, ExecutionError>;

    /// Sign the quote hash with the account's signer and submit it.
    async fn execute_quote(
        &self,
        account: &OrchestratorAccount,
        quote: &Quote,
    ) -> Result<TxHandle, ExecutionError>;

    /// Block until the batch reaches a terminal status.
    async fn wait_for_receipt(&self, handle: &TxHandle) -> Result<Receipt, ExecutionError>;
}

/// Reject requests the service would refuse anyway.
pub fn validate_quote_request(
    account: &OrchestratorAccount,
    request: &QuoteRequest,
) -> Result<(), ExecutionError> {
    if request.instructions.is_empty() {
        return Err(ExecutionError::InvalidRequest(
            "a quote needs at least one instruction".to_string(),
        ));
    }

    let chains = request
        .instructions
        .iter()
        .map(|i| i.chain_id)
        .chain([
            request.funding_trigger.chain_id,
            request.fee_token.chain_id,
        ]);
    for chain_id in chains {
        if !account.supports(chain_id) {
            return Err(ExecutionError::InvalidRequest(format!(
                "account is not deployed on chain {chain_id}"
            )));
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ExecuteResponse {
    hash: alloy::primitives::B256,
}

/// HTTP implementation of [`ExecutionClient`].
#[derive(Debug, Clone)]
pub struct HttpExecutionClient {
    base_url: String,
    api_key: String,
    http: Client,
    receipt_poll_interval: Duration,
    receipt_timeout: Duration,
}

impl HttpExecutionClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ExecutionError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| ExecutionError::InvalidRequest(format!("invalid service URL: {e}")))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ExecutionError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        })
    }

    pub fn with_receipt_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.receipt_poll_interval = interval;
        self.receipt_timeout = timeout;
        self
    }

    async fn post_json(&self, route: &str, body: &Value) -> Result<Value, ExecutionError> {
        let response = self
            .http
            .post(format!("{}{route}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ExecutionError::Network(format!("POST {route} failed: {e}")))?;
        read_json(route, response).await
    }

    async fn get_json(&self, route: &str) -> Result<Value, ExecutionError> {
        let response = self
            .http
            .get(format!("{}{route}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|e| ExecutionError::Network(format!("GET {route} failed: {e}")))?;
        read_json(route, response).await
    }
}

async fn read_json(route: &str, response: reqwest::Response) -> Result<Value, ExecutionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or(body);
        return Err(ExecutionError::Api {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json()
        .await
        .map_err(|e| ExecutionError::InvalidResponse(format!("{route}: {e}")))
}

fn decode<T: serde::de::DeserializeOwned>(route: &str, value: Value) -> Result<T, ExecutionError> {
    serde_json::from_value(value).map_err(|e| ExecutionError::InvalidResponse(format!("{route}: {e}")))
}

#[async_trait]
impl ExecutionClient for HttpExecutionClient {
    async fn get_quote(
        &self,
        account: &OrchestratorAccount,
        request: &QuoteRequest,
    ) -> Result<Quote, ExecutionError> {
        validate_quote_request(account, request)?;

        let body = json!({
            "account": account.descriptor(),
            "instructions": request.instructions,
            "funding_trigger": request.funding_trigger,
            "fee_token": request.fee_token,
            "simulate": request.simulate,
        });

        let quote: Quote = decode("/v1/quote", self.post_json("/v1/quote", &body).await?)?;
        info!(
            owner = %account.owner(),
            quote_hash = %quote.hash,
            fee = %quote.fee.amount,
            instructions = request.instructions.len(),
            "Quote received"
        );
        Ok(quote)
    }

    async fn execute_quote(
        &self,
        account: &OrchestratorAccount,
        quote: &Quote,
    ) -> Result<TxHandle, ExecutionError> {
        let signature = account
            .signer()
            .sign_message(SignableMessage::Raw(Bytes::copy_from_slice(
                quote.hash.as_slice(),
            )))
            .await?;

        let body = json!({
            "hash": quote.hash,
            "signature": signature,
            "quote": quote.payload,
        });

        let response: ExecuteResponse = decode("/v1/exec", self.post_json("/v1/exec", &body).await?)?;
        info!(owner = %account.owner(), hash = %response.hash, "Batch submitted");
        Ok(TxHandle {
            hash: response.hash,
        })
    }

    async fn wait_for_receipt(&self, handle: &TxHandle) -> Result<Receipt, ExecutionError> {
        let route = format!("/v1/explorer/{}", handle.hash);
        let started = tokio::time::Instant::now();

        loop {
            let receipt: Receipt = decode(&route, self.get_json(&route).await?)?;
            match receipt.status {
                ReceiptStatus::Success => {
                    info!(hash = %handle.hash, transactions = receipt.transactions.len(), "Batch confirmed");
                    return Ok(receipt);
                }
                ReceiptStatus::Failed => {
                    let reason = receipt
                        .error
                        .clone()
                        .unwrap_or_else(|| "no reason given".to_string());
                    warn!(hash = %handle.hash, reason = %reason, "Batch failed");
                    return Err(ExecutionError::Failed {
                        hash: handle.hash.to_string(),
                        reason,
                    });
                }
                ReceiptStatus::Pending => {
                    debug!(hash = %handle.hash, "Batch pending");
                }
            }

            if started.elapsed() + self.receipt_poll_interval > self.receipt_timeout {
                return Err(ExecutionError::Timeout {
                    hash: handle.hash.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}
