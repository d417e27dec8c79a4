// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. All types derive `ToSchema`
//! for OpenAPI documentation.
//!
//! ## Model Categories
//!
//! - **Configuration**: Status panel per provider
//! - **Sessions**: Connected wallets and their balances
//! - **Signing**: Message and typed-data signatures through the adapter
//! - **Transfers**: Batch transfer quotes and receipts

use std::collections::BTreeMap;

use alloy::primitives::{hex, Address, Bytes, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ConfigIssue, LogFormat};
use crate::execution::{Receipt, ReceiptStatus};
use crate::providers::ProviderKind;
use crate::session::{BalanceSnapshot, PendingTransfer};
use crate::signer::{SignableMessage, SignerError, TypedDataDomain, TypedDataPayload, TypedField, TypedValue};

// =============================================================================
// Configuration
// =============================================================================

/// Setup state of one provider.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    /// Whether every required key is set
    pub configured: bool,
    /// Environment variables still to set
    pub missing_keys: Vec<String>,
    /// How to finish the setup
    pub instructions: String,
}

/// Configuration status panel.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConfigStatusResponse {
    /// Whether quotes and executions can run
    pub execution_ready: bool,
    pub chain_id: u64,
    pub network: String,
    pub account_version: String,
    /// Transfer token address
    pub transfer_token: String,
    pub transfer_token_symbol: String,
    pub transfer_token_decimals: u8,
    pub fee_token: String,
    pub log_format: LogFormat,
    pub providers: Vec<ProviderStatus>,
    /// Missing or malformed keys
    pub issues: Vec<ConfigIssue>,
}

// =============================================================================
// Sessions
// =============================================================================

/// A connected wallet session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub provider: ProviderKind,
    /// Checksummed wallet address
    pub address: String,
    /// Chains the orchestrator account runs on
    pub chain_ids: Vec<u64>,
    pub account_version: String,
    pub created_at: DateTime<Utc>,
    /// False when an existing session was returned
    pub created: bool,
    /// Bearer token for the other session routes, only returned on creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Quote awaiting execution, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_quote: Option<QuoteResponse>,
}

/// Last known balances of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: String,
    #[serde(flatten)]
    pub balances: BalanceSnapshot,
}

// =============================================================================
// Signing
// =============================================================================

/// How `message` is to be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageEncoding {
    /// Sign the UTF-8 text as given
    #[default]
    Text,
    /// `message` is 0x-prefixed hex; sign the decoded bytes
    Hex,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignMessageRequest {
    pub message: String,
    #[serde(default)]
    pub encoding: MessageEncoding,
}

impl SignMessageRequest {
    pub fn into_message(self) -> Result<SignableMessage, SignerError> {
        match self.encoding {
            MessageEncoding::Text => Ok(SignableMessage::Text(self.message)),
            MessageEncoding::Hex => {
                let bytes = hex::decode(self.message.trim()).map_err(|e| {
                    SignerError::InvalidPayload(format!("message is not valid hex: {e}"))
                })?;
                Ok(SignableMessage::Raw(Bytes::from(bytes)))
            }
        }
    }
}

/// EIP-712 domain as received over the API. `chainId` may be a number or a
/// decimal/hex string.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypedDomainInput {
    pub name: Option<String>,
    pub version: Option<String>,
    #[schema(value_type = Option<String>)]
    pub chain_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub verifying_contract: Option<Address>,
    #[schema(value_type = Option<String>)]
    pub salt: Option<alloy::primitives::B256>,
}

/// Structured data to sign, in the `eth_signTypedData_v4` shape.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignTypedDataRequest {
    #[serde(default)]
    pub domain: TypedDomainInput,
    /// Struct definitions; `EIP712Domain` is derived when absent
    #[schema(value_type = Object)]
    pub types: BTreeMap<String, Vec<TypedField>>,
    pub primary_type: String,
    #[schema(value_type = Object)]
    pub message: serde_json::Map<String, Value>,
}

fn parse_chain_id(value: &Value) -> Result<U256, SignerError> {
    let invalid = || SignerError::InvalidPayload(format!("invalid chainId {value}"));
    match value {
        Value::Number(n) => U256::from_str_radix(&n.to_string(), 10).map_err(|_| invalid()),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x") {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            }
            .map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

impl TryFrom<SignTypedDataRequest> for TypedDataPayload {
    type Error = SignerError;

    fn try_from(request: SignTypedDataRequest) -> Result<Self, Self::Error> {
        let domain = TypedDataDomain {
            name: request.domain.name,
            version: request.domain.version,
            chain_id: request
                .domain
                .chain_id
                .as_ref()
                .map(parse_chain_id)
                .transpose()?,
            verifying_contract: request.domain.verifying_contract,
            salt: request.domain.salt,
        };

        let message = request
            .message
            .iter()
            .map(|(name, value)| Ok((name.clone(), TypedValue::from_json(value)?)))
            .collect::<Result<BTreeMap<_, _>, SignerError>>()?;

        let payload = TypedDataPayload {
            domain,
            types: request.types,
            primary_type: request.primary_type,
            message,
        };
        payload.validate()?;
        Ok(payload)
    }
}

/// A signature produced by the wallet provider.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignatureResponse {
    /// Signer address
    pub address: String,
    /// 0x-prefixed signature bytes exactly as the provider returned them
    #[schema(value_type = String)]
    pub signature: Bytes,
}

// =============================================================================
// Transfers
// =============================================================================

/// Send `amount` (in display units) to each recipient in one batch.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TransferQuoteRequest {
    pub recipients: Vec<String>,
    /// Per-recipient amount, e.g. "1.5"
    pub amount: String,
}

/// A quoted batch transfer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuoteResponse {
    pub quote_hash: String,
    pub recipients: Vec<String>,
    /// Per-recipient amount in token base units
    pub amount_raw: String,
    /// Funding trigger amount in token base units
    pub total_raw: String,
    pub total_formatted: String,
    pub fee_raw: String,
    pub fee_token: String,
    pub quoted_at: DateTime<Utc>,
}

impl QuoteResponse {
    pub fn from_pending(pending: &PendingTransfer, decimals: u8) -> Self {
        Self {
            quote_hash: pending.quote.hash.to_string(),
            recipients: pending
                .recipients
                .iter()
                .map(|r| r.to_checksum(None))
                .collect(),
            amount_raw: pending.amount.to_string(),
            total_raw: pending.total.to_string(),
            total_formatted: crate::blockchain::format_amount(pending.total, decimals),
            fee_raw: pending.quote.fee.amount.to_string(),
            fee_token: pending.quote.fee.token.to_checksum(None),
            quoted_at: pending.quoted_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChainTransactionResponse {
    pub chain_id: u64,
    pub tx_hash: String,
    /// Block explorer link when the chain is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
}

/// Outcome of an executed batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExecuteResponse {
    pub quote_hash: String,
    pub batch_hash: String,
    #[schema(value_type = String)]
    pub status: ReceiptStatus,
    pub transactions: Vec<ChainTransactionResponse>,
}

impl ExecuteResponse {
    pub fn from_receipt(quote_hash: String, receipt: &Receipt) -> Self {
        Self {
            quote_hash,
            batch_hash: receipt.hash.to_string(),
            status: receipt.status,
            transactions: receipt
                .transactions
                .iter()
                .map(|tx| ChainTransactionResponse {
                    chain_id: tx.chain_id,
                    tx_hash: tx.tx_hash.to_string(),
                    explorer_url: crate::blockchain::NetworkConfig::known(tx.chain_id)
                        .map(|n| n.tx_url(&tx.tx_hash.to_string())),
                })
                .collect(),
        }
    }
}
