// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Execution service request and response types.
//!
//! Token amounts travel as base-10 strings on the wire so 256-bit values
//! survive any JSON parser.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serde adapter writing `U256` as a decimal string.
///
/// Decimal and `0x`-prefixed hex strings are both accepted when reading.
pub mod decimal_u256 {
    use alloy::primitives::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        let parsed = match raw.strip_prefix("0x") {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(raw, 10),
        };
        parsed.map_err(|e| D::Error::custom(format!("invalid amount `{raw}`: {e}")))
    }
}

/// What a contract call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFunction {
    /// ERC-20 `transfer(to, amount)` on the target token.
    Erc20Transfer { to: Address, amount: U256 },
    /// Pre-encoded calldata.
    Raw { data: Bytes },
}

/// Call descriptor turned into an [`Instruction`] by the execution client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub chain_id: u64,
    pub target: Address,
    pub value: U256,
    pub function: CallFunction,
}

impl ContractCall {
    pub fn erc20_transfer(chain_id: u64, token: Address, to: Address, amount: U256) -> Self {
        Self {
            chain_id,
            target: token,
            value: U256::ZERO,
            function: CallFunction::Erc20Transfer { to, amount },
        }
    }
}

/// A single encoded call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub to: Address,
    #[serde(with = "decimal_u256")]
    pub value: U256,
    pub data: Bytes,
}

/// Calls to run on one chain as part of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub chain_id: u64,
    pub calls: Vec<Call>,
}

/// Authorization for the orchestrator account to pull `amount` of `token`
/// from the end-user wallet before running the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingTrigger {
    pub chain_id: u64,
    pub token: Address,
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

/// Token used to pay execution fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeToken {
    pub chain_id: u64,
    pub address: Address,
}

/// Everything needed to price a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub instructions: Vec<Instruction>,
    pub funding_trigger: FundingTrigger,
    pub fee_token: FeeToken,
    pub simulate: bool,
}

/// Fee charged for a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteFee {
    pub chain_id: u64,
    pub token: Address,
    #[serde(with = "decimal_u256")]
    pub amount: U256,
}

/// A priced batch. `hash` is what the end user signs; `payload` is handed
/// back to the service untouched when executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub hash: B256,
    pub fee: QuoteFee,
    #[serde(default)]
    pub payload: Value,
}

/// Handle of a submitted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle {
    pub hash: B256,
}

/// Batch status reported by the service's explorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Pending,
    Success,
    Failed,
}

/// An on-chain transaction belonging to a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
    pub chain_id: u64,
    pub tx_hash: B256,
}

/// Final confirmation of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub hash: B256,
    pub status: ReceiptStatus,
    #[serde(default)]
    pub transactions: Vec<ChainTransaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
