// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Messages accepted by `personal_sign`.

use alloy::primitives::{hex, Bytes};

/// A message to be signed with the provider's personal-sign capability.
///
/// Plain strings are forwarded untouched. Raw bytes are hex-encoded with a
/// leading `0x`, which every EIP-1193 wallet interprets as binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignableMessage {
    Text(String),
    Raw(Bytes),
}

impl SignableMessage {
    /// Encoding handed to the provider transport.
    pub fn to_provider_payload(&self) -> String {
        match self {
            SignableMessage::Text(text) => text.clone(),
            SignableMessage::Raw(bytes) => hex::encode_prefixed(bytes),
        }
    }

    /// Bytes the wallet ultimately signs (after the EIP-191 prefix is added).
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            SignableMessage::Text(text) => text.as_bytes(),
            SignableMessage::Raw(bytes) => bytes.as_ref(),
        }
    }
}

impl From<&str> for SignableMessage {
    fn from(value: &str) -> Self {
        SignableMessage::Text(value.to_string())
    }
}

impl From<String> for SignableMessage {
    fn from(value: String) -> Self {
        SignableMessage::Text(value)
    }
}

impl From<Bytes> for SignableMessage {
    fn from(value: Bytes) -> Self {
        SignableMessage::Raw(value)
    }
}

impl From<Vec<u8>> for SignableMessage {
    fn from(value: Vec<u8>) -> Self {
        SignableMessage::Raw(Bytes::from(value))
    }
}
