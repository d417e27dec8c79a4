// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capability-narrowing signer adapter.
//!
//! A [`SignerTransport`] is whatever a wallet provider natively offers:
//! an injected EIP-1193 provider, an embedded wallet's RPC channel, a
//! session-token signing API, or a local key. [`SignerAdapter`] wraps one
//! and exposes exactly what the execution service consumes through
//! [`OrchestratorSigner`]: message and typed-data signatures. Raw
//! transaction signing is refused, since every on-chain effect goes through
//! the orchestrator account's signed batch.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::{debug, warn};

use super::error::SignerError;
use super::message::SignableMessage;
use super::typed_data::TypedDataPayload;

/// Outcome of asking a provider to switch its active chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainSwitch {
    Switched,
    /// The provider cannot switch (unknown chain or no such capability).
    /// Signing still works: the execution service binds chain ids inside the
    /// signed quote, not through the wallet's active chain.
    NotSupported { reason: String },
}

/// Provider-native signing channel.
#[async_trait]
pub trait SignerTransport: Send + Sync {
    /// Short provider label for logs.
    fn label(&self) -> &'static str;

    /// Address of the currently authenticated wallet, `None` when the
    /// provider has no active session.
    async fn current_address(&self) -> Result<Option<Address>, SignerError>;

    /// Native `personal_sign`. `message` is already normalized.
    async fn personal_sign(&self, address: Address, message: &str) -> Result<Bytes, SignerError>;

    /// Native `eth_signTypedData_v4`. `payload` is the serialized JSON.
    async fn sign_typed_data_v4(&self, address: Address, payload: &str)
        -> Result<Bytes, SignerError>;

    /// Ask the provider to make `chain_id` its active chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<ChainSwitch, SignerError> {
        let _ = chain_id;
        Ok(ChainSwitch::NotSupported {
            reason: format!("{} has no chain switching", self.label()),
        })
    }
}

/// The signer shape handed to the orchestrator account.
#[async_trait]
pub trait OrchestratorSigner: Send + Sync {
    /// Checksummed address captured when the session was created.
    fn address(&self) -> Address;

    async fn sign_message(&self, message: SignableMessage) -> Result<Bytes, SignerError>;

    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Bytes, SignerError>;

    async fn sign_transaction(&self, tx: &TransactionRequest) -> Result<Bytes, SignerError>;
}

/// Adapter binding a transport to the address it authenticated as.
pub struct SignerAdapter<T: ?Sized> {
    address: Address,
    transport: Arc<T>,
}

impl<T: SignerTransport + ?Sized> SignerAdapter<T> {
    /// Capture the transport's current address.
    ///
    /// Fails with `SessionExpired` when the provider has no authenticated
    /// wallet.
    pub async fn connect(transport: Arc<T>) -> Result<Self, SignerError> {
        let address = transport.current_address().await?.ok_or_else(|| {
            SignerError::SessionExpired(format!(
                "{} has no authenticated wallet",
                transport.label()
            ))
        })?;

        debug!(provider = transport.label(), address = %address, "Signer adapter connected");
        Ok(Self { address, transport })
    }

    /// Build an adapter for a known address without querying the provider.
    #[cfg(test)]
    pub(crate) fn with_address(address: Address, transport: Arc<T>) -> Self {
        Self { address, transport }
    }

    /// Make sure the provider is still authenticated as the captured address.
    async fn ensure_session(&self) -> Result<(), SignerError> {
        match self.transport.current_address().await? {
            Some(current) if current == self.address => Ok(()),
            Some(current) => Err(SignerError::SessionExpired(format!(
                "{} is now authenticated as {}, expected {}",
                self.transport.label(),
                current,
                self.address
            ))),
            None => Err(SignerError::SessionExpired(format!(
                "{} session ended",
                self.transport.label()
            ))),
        }
    }

    /// Switch the provider to `chain_id`. Unsupported switches are logged and
    /// reported, never fatal.
    pub async fn ensure_chain(&self, chain_id: u64) -> Result<ChainSwitch, SignerError> {
        let outcome = self.transport.switch_chain(chain_id).await?;
        if let ChainSwitch::NotSupported { reason } = &outcome {
            warn!(
                provider = self.transport.label(),
                chain_id,
                reason = %reason,
                "Chain switch not performed, continuing on the provider's active chain"
            );
        }
        Ok(outcome)
    }
}

#[async_trait]
impl<T: SignerTransport + ?Sized> OrchestratorSigner for SignerAdapter<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_message(&self, message: SignableMessage) -> Result<Bytes, SignerError> {
        self.ensure_session().await?;
        let payload = message.to_provider_payload();
        self.transport.personal_sign(self.address, &payload).await
    }

    async fn sign_typed_data(&self, payload: &TypedDataPayload) -> Result<Bytes, SignerError> {
        let json = payload.to_json_string()?;
        self.ensure_session().await?;
        self.transport.sign_typed_data_v4(self.address, &json).await
    }

    async fn sign_transaction(&self, _tx: &TransactionRequest) -> Result<Bytes, SignerError> {
        Err(SignerError::UnsupportedOperation(
            "sign_transaction is not offered; execution is authorized by quote signatures"
                .to_string(),
        ))
    }
}
