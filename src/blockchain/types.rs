// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// EVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: String,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Block explorer URL
    pub explorer_url: String,
}

impl NetworkConfig {
    /// Base Sepolia testnet.
    pub fn base_sepolia() -> Self {
        Self {
            name: "Base Sepolia".to_string(),
            chain_id: 84532,
            rpc_url: "https://sepolia.base.org".to_string(),
            explorer_url: "https://sepolia.basescan.org".to_string(),
        }
    }

    /// Optimism Sepolia testnet.
    pub fn optimism_sepolia() -> Self {
        Self {
            name: "OP Sepolia".to_string(),
            chain_id: 11155420,
            rpc_url: "https://sepolia.optimism.io".to_string(),
            explorer_url: "https://sepolia-optimism.etherscan.io".to_string(),
        }
    }

    /// Look up a built-in network by chain id.
    pub fn known(chain_id: u64) -> Option<Self> {
        [Self::base_sepolia(), Self::optimism_sepolia()]
            .into_iter()
            .find(|n| n.chain_id == chain_id)
    }

    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}

/// ERC-20 token metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Token {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub address: Address,
}

/// Circle's USDC on Base Sepolia.
pub const USDC_BASE_SEPOLIA: Address = address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e");

impl Erc20Token {
    pub fn usdc_base_sepolia() -> Self {
        Self {
            symbol: "USDC".to_string(),
            name: "USD Coin".to_string(),
            decimals: 6,
            address: USDC_BASE_SEPOLIA,
        }
    }
}

/// Token balance information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    /// Token symbol (e.g., "ETH", "USDC")
    pub symbol: String,
    /// Token name
    pub name: String,
    /// Balance in smallest unit (wei for native, token decimals for ERC-20)
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
    /// Number of decimals
    pub decimals: u8,
    /// Contract address (None for native token)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks_resolve_by_chain_id() {
        assert_eq!(NetworkConfig::known(84532), Some(NetworkConfig::base_sepolia()));
        assert_eq!(NetworkConfig::known(11155420).unwrap().name, "OP Sepolia");
        assert!(NetworkConfig::known(1).is_none());
    }

    #[test]
    fn tx_url_joins_explorer_and_hash() {
        let network = NetworkConfig::base_sepolia();
        assert_eq!(
            network.tx_url("0xabc"),
            "https://sepolia.basescan.org/tx/0xabc"
        );
    }
}
