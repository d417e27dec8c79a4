// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Batch Signer Bridge - Wallet Provider Adapters for Batch Execution
//!
//! Adapts browser-extension and embedded wallet providers to the signer
//! shape an external batch-transaction execution service consumes, and
//! serves a small API that quotes and executes batched token transfers with
//! them.
//!
//! ## Modules
//!
//! - `signer` - Signer adapter, message and typed-data normalization
//! - `providers` - Wallet provider transports
//! - `execution` - Execution service client and orchestrator account
//! - `transfer` - Batch transfer planning
//! - `session` - Wallet sessions and balance polling
//! - `blockchain` - EVM balance reads
//! - `api` - HTTP API handlers (Axum)

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod models;
pub mod providers;
pub mod session;
pub mod signer;
pub mod state;
pub mod transfer;
