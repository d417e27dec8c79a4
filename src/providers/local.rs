// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local development signer.
//!
//! Holds a secp256k1 key loaded from a PEM file or a hex string and signs
//! in-process. Useful for running the demo without a wallet provider.

use std::path::Path;
use std::str::FromStr;

use alloy::{
    dyn_abi::TypedData,
    primitives::{hex, Address, Bytes},
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;
use k256::SecretKey;

use crate::signer::{SignerError, SignerTransport};

/// Parse a private key from PEM format to hex string.
///
/// Accepts SEC1 (`EC PRIVATE KEY`) and PKCS#8 (`PRIVATE KEY`) encodings.
///
/// # Returns
/// * `Ok(String)` - Hex-encoded private key (64 characters, no 0x prefix)
/// * `Err(SignerError)` - If PEM parsing fails
pub fn pem_to_hex(pem_bytes: &[u8]) -> Result<String, SignerError> {
    let pem_str = std::str::from_utf8(pem_bytes)
        .map_err(|e| SignerError::InvalidPayload(format!("Invalid UTF-8: {}", e)))?;

    let pem = pem::parse(pem_str)
        .map_err(|e| SignerError::InvalidPayload(format!("Invalid PEM: {}", e)))?;

    let secret_key = SecretKey::from_sec1_der(pem.contents())
        .or_else(|_| parse_pkcs8_to_secret_key(pem.contents()))
        .map_err(|e| SignerError::InvalidPayload(format!("Invalid key format: {}", e)))?;

    Ok(hex::encode(secret_key.to_bytes()))
}

fn parse_pkcs8_to_secret_key(der: &[u8]) -> Result<SecretKey, String> {
    use k256::pkcs8::DecodePrivateKey;
    SecretKey::from_pkcs8_der(der).map_err(|e| e.to_string())
}

/// Create a signer from a hex private key, with or without `0x`.
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, SignerError> {
    let key = private_key_hex.trim();
    let key = key.strip_prefix("0x").unwrap_or(key);
    PrivateKeySigner::from_str(key)
        .map_err(|e| SignerError::InvalidPayload(format!("Invalid private key: {}", e)))
}

/// Create a signer from PEM-encoded private key bytes.
pub fn signer_from_pem(pem_bytes: &[u8]) -> Result<PrivateKeySigner, SignerError> {
    signer_from_hex(&pem_to_hex(pem_bytes)?)
}

/// In-process key transport.
#[derive(Debug, Clone)]
pub struct LocalKeyTransport {
    signer: PrivateKeySigner,
}

impl LocalKeyTransport {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    pub fn from_hex(private_key_hex: &str) -> Result<Self, SignerError> {
        signer_from_hex(private_key_hex).map(Self::new)
    }

    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let pem_bytes = std::fs::read(path).map_err(|e| {
            SignerError::InvalidPayload(format!("Cannot read key file {}: {}", path.display(), e))
        })?;
        signer_from_pem(&pem_bytes).map(Self::new)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

#[async_trait]
impl SignerTransport for LocalKeyTransport {
    fn label(&self) -> &'static str {
        "local"
    }

    async fn current_address(&self) -> Result<Option<Address>, SignerError> {
        Ok(Some(self.signer.address()))
    }

    /// `0x`-prefixed valid hex is signed as bytes, anything else as UTF-8,
    /// matching how browser wallets read `personal_sign` input.
    async fn personal_sign(&self, address: Address, message: &str) -> Result<Bytes, SignerError> {
        if address != self.signer.address() {
            return Err(SignerError::SessionExpired(format!(
                "local key belongs to {}, not {}",
                self.signer.address(),
                address
            )));
        }

        let bytes = match message.strip_prefix("0x").map(hex::decode) {
            Some(Ok(decoded)) => decoded,
            _ => message.as_bytes().to_vec(),
        };

        let signature = self
            .signer
            .sign_message(&bytes)
            .await
            .map_err(|e| SignerError::Provider {
                code: 0,
                message: format!("local signing failed: {e}"),
            })?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }

    async fn sign_typed_data_v4(
        &self,
        address: Address,
        payload: &str,
    ) -> Result<Bytes, SignerError> {
        if address != self.signer.address() {
            return Err(SignerError::SessionExpired(format!(
                "local key belongs to {}, not {}",
                self.signer.address(),
                address
            )));
        }

        let typed: TypedData = serde_json::from_str(payload)
            .map_err(|e| SignerError::InvalidPayload(format!("Invalid typed data: {e}")))?;

        let signature = self
            .signer
            .sign_dynamic_typed_data(&typed)
            .await
            .map_err(|e| SignerError::Provider {
                code: 0,
                message: format!("local typed-data signing failed: {e}"),
            })?;
        Ok(Bytes::from(signature.as_bytes().to_vec()))
    }
}
