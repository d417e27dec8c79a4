// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM chain integration.
//!
//! This module provides functionality for:
//! - Querying native and ERC-20 balances for balance polling
//! - Encoding ERC-20 calls for execution instructions
//! - Converting between display amounts and base units

pub mod client;
pub mod erc20;
pub mod types;
pub mod units;

pub use client::{ChainClient, ChainClientError};
pub use types::*;
pub use units::{format_amount, format_balance, parse_amount, MAX_TOKEN_DECIMALS};
