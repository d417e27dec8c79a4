// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interactions.

use alloy::{
    primitives::{Address, Bytes, U256},
    providers::Provider,
    sol,
    sol_types::SolCall,
};

use super::client::ChainClientError;
use super::types::{Erc20Token, TokenBalance};
use super::units::format_balance;

// Define the ERC-20 interface using alloy's sol! macro
sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

/// ABI-encoded `transfer(to, amount)` calldata.
pub fn transfer_calldata(to: Address, amount: U256) -> Bytes {
    IERC20::transferCall { to, amount }.abi_encode().into()
}

/// ERC-20 contract wrapper.
pub struct Erc20Contract<P> {
    contract: IERC20::IERC20Instance<P>,
    address: Address,
}

impl<P: Provider + Clone> Erc20Contract<P> {
    /// Create a new ERC-20 contract instance.
    pub fn new(provider: &P, address: Address) -> Self {
        let contract = IERC20::new(address, provider.clone());
        Self { contract, address }
    }

    /// Balance of an address, formatted with the token's known metadata.
    ///
    /// Metadata comes from configuration so one poll costs a single
    /// `eth_call`.
    pub async fn balance_of(
        &self,
        owner: Address,
        token: &Erc20Token,
    ) -> Result<TokenBalance, ChainClientError> {
        let balance = self
            .contract
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| ChainClientError::ContractError(e.to_string()))?;

        Ok(TokenBalance {
            symbol: token.symbol.clone(),
            name: token.name.clone(),
            balance_raw: balance.to_string(),
            balance_formatted: format_balance(balance, token.decimals),
            decimals: token.decimals,
            contract_address: Some(self.address.to_checksum(None)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_calldata_has_selector_and_arguments() {
        let to: Address = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".parse().unwrap();
        let data = transfer_calldata(to, U256::from(1_000_000u64));

        // transfer(address,uint256) selector
        assert_eq!(&data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), U256::from(1_000_000u64));
    }
}
