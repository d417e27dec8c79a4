// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signer adapters.
//!
//! This module provides:
//! - The [`OrchestratorSigner`] capability set consumed by the execution service
//! - The [`SignerTransport`] seam each wallet provider implements
//! - Message normalization and EIP-712 payload serialization

pub mod adapter;
pub mod error;
pub mod message;
pub mod typed_data;

pub use adapter::{ChainSwitch, OrchestratorSigner, SignerAdapter, SignerTransport};
pub use error::SignerError;
pub use message::SignableMessage;
pub use typed_data::{TypedDataDomain, TypedDataPayload, TypedField, TypedValue};
