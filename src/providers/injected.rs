// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Browser-extension wallet reached through its injected EIP-1193 provider.
//!
//! The extension's `window.ethereum` requests are relayed to this service
//! over a JSON-RPC bridge URL supplied when the session connects.

use alloy::primitives::{Address, Bytes};
use async_trait::async_trait;
use serde_json::{json, Value};

use super::rpc::{
    parse_signature, JsonRpcChannel, DEFAULT_PROVIDER_TIMEOUT, METHOD_NOT_FOUND,
    UNRECOGNIZED_CHAIN, UNSUPPORTED_METHOD,
};
use crate::signer::{ChainSwitch, SignerError, SignerTransport};

/// Injected EIP-1193 wallet transport.
#[derive(Debug)]
pub struct InjectedWalletTransport {
    channel: JsonRpcChannel,
}

impl InjectedWalletTransport {
    pub fn new(bridge_url: &str) -> Result<Self, SignerError> {
        Ok(Self {
            channel: JsonRpcChannel::new(bridge_url, DEFAULT_PROVIDER_TIMEOUT)?,
        })
    }
}

#[async_trait]
impl SignerTransport for InjectedWalletTransport {
    fn label(&self) -> &'static str {
        "injected"
    }

    async fn current_address(&self) -> Result<Option<Address>, SignerError> {
        let accounts: Vec<Address> = self.channel.call("eth_accounts", json!([])).await?;
        Ok(accounts.into_iter().next())
    }

    async fn personal_sign(&self, address: Address, message: &str) -> Result<Bytes, SignerError> {
        let signature: String = self
            .channel
            .call("personal_sign", json!([message, address.to_checksum(None)]))
            .await?;
        parse_signature(&signature)
    }

    async fn sign_typed_data_v4(
        &self,
        address: Address,
        payload: &str,
    ) -> Result<Bytes, SignerError> {
        let signature: String = self
            .channel
            .call(
                "eth_signTypedData_v4",
                json!([address.to_checksum(None), payload]),
            )
            .await?;
        parse_signature(&signature)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<ChainSwitch, SignerError> {
        let result: Result<Value, SignerError> = self
            .channel
            .call(
                "wallet_switchEthereumChain",
                json!([{ "chainId": format!("0x{chain_id:x}") }]),
            )
            .await;

        match result {
            Ok(_) => Ok(ChainSwitch::Switched),
            Err(SignerError::Provider { code, message })
                if matches!(code, UNRECOGNIZED_CHAIN | UNSUPPORTED_METHOD | METHOD_NOT_FOUND) =>
            {
                Ok(ChainSwitch::NotSupported {
                    reason: format!("code {code}: {message}"),
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::{OrchestratorSigner, SignableMessage, SignerAdapter};
    use std::sync::Arc;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALICE: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": result,
        }))
    }

    fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message },
        }))
    }

    async fn mount_accounts(server: &MockServer, accounts: Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "eth_accounts" })))
            .respond_with(rpc_result(accounts))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn personal_sign_forwards_message_and_address() {
        let server = MockServer::start().await;
        mount_accounts(&server, json!([ALICE])).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "personal_sign",
                "params": ["hello world", "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"],
            })))
            .respond_with(rpc_result(json!("0x1234")))
            .expect(1)
            .mount(&server)
            .await;

        let transport = Arc::new(InjectedWalletTransport::new(&server.uri()).unwrap());
        let adapter = SignerAdapter::connect(transport).await.unwrap();
        let signature = adapter
            .sign_message(SignableMessage::from("hello world"))
            .await
            .unwrap();

        assert_eq!(signature.as_ref(), &[0x12, 0x34]);
    }

    #[tokio::test]
    async fn user_rejection_maps_to_signing_rejected() {
        let server = MockServer::start().await;
        mount_accounts(&server, json!([ALICE])).await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "personal_sign" })))
            .respond_with(rpc_error(4001, "User rejected the request."))
            .mount(&server)
            .await;

        let transport = Arc::new(InjectedWalletTransport::new(&server.uri()).unwrap());
        let adapter = SignerAdapter::connect(transport).await.unwrap();

        assert!(matches!(
            adapter.sign_message("hi".into()).await,
            Err(SignerError::SigningRejected(_))
        ));
    }

    #[tokio::test]
    async fn no_accounts_means_no_session() {
        let server = MockServer::start().await;
        mount_accounts(&server, json!([])).await;

        let transport = InjectedWalletTransport::new(&server.uri()).unwrap();
        assert_eq!(transport.current_address().await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_chain_is_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "method": "wallet_switchEthereumChain",
                "params": [{ "chainId": "0x14a34" }],
            })))
            .respond_with(rpc_error(4902, "Unrecognized chain ID"))
            .mount(&server)
            .await;

        let transport = InjectedWalletTransport::new(&server.uri()).unwrap();
        let outcome = transport.switch_chain(84532).await.unwrap();
        assert!(matches!(outcome, ChainSwitch::NotSupported { .. }));
    }

    #[tokio::test]
    async fn successful_chain_switch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "wallet_switchEthereumChain" })))
            .respond_with(rpc_result(Value::Null))
            .mount(&server)
            .await;

        let transport = InjectedWalletTransport::new(&server.uri()).unwrap();
        assert_eq!(
            transport.switch_chain(1).await.unwrap(),
            ChainSwitch::Switched
        );
    }

    #[tokio::test]
    async fn rejected_chain_switch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "wallet_switchEthereumChain" })))
            .respond_with(rpc_error(4001, "User rejected"))
            .mount(&server)
            .await;

        let transport = InjectedWalletTransport::new(&server.uri()).unwrap();
        assert!(matches!(
            transport.switch_chain(1).await,
            Err(SignerError::SigningRejected(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_bridge_is_a_network_error() {
        let transport = InjectedWalletTransport::new("http://127.0.0.1:1").unwrap();
        assert!(matches!(
            transport.current_address().await,
            Err(SignerError::Network(_))
        ));
    }
}
