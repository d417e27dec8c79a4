// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Batch execution service integration.

pub mod account;
pub mod client;
pub mod types;

pub use account::{AccountDescriptor, ChainDeployment, OrchestratorAccount};
pub use client::{
    encode_instruction, ExecutionClient, ExecutionError, HttpExecutionClient,
    DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT,
};
pub use types::*;
