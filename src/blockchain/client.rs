// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only EVM client used for balance polling.

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};

use super::erc20::Erc20Contract;
use super::types::*;
use super::units::format_balance;

/// EVM JSON-RPC client.
#[derive(Clone)]
pub struct ChainClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider
    provider: DynProvider<Ethereum>,
}

impl ChainClient {
    /// Create a new client for the specified network.
    pub fn new(network: NetworkConfig) -> Result<Self, ChainClientError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self { network, provider })
    }

    /// Get the native balance for an address.
    pub async fn get_native_balance(
        &self,
        address: Address,
    ) -> Result<TokenBalance, ChainClientError> {
        let balance = self
            .provider
            .get_balance(address)
            .await
            .map_err(|e| ChainClientError::RpcError(e.to_string()))?;

        Ok(TokenBalance {
            symbol: "ETH".to_string(),
            name: "Ether".to_string(),
            balance_raw: balance.to_string(),
            balance_formatted: format_balance(balance, 18),
            decimals: 18,
            contract_address: None,
        })
    }

    /// Get the ERC-20 token balance for an address.
    pub async fn get_token_balance(
        &self,
        owner: Address,
        token: &Erc20Token,
    ) -> Result<TokenBalance, ChainClientError> {
        Erc20Contract::new(&self.provider, token.address)
            .balance_of(owner, token)
            .await
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// Errors that can occur during blockchain reads.
#[derive(Debug, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),
}
