// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sessions.
//!
//! A session exists per authenticated address and is only reachable with the
//! access token issued when it was created. It owns the signer adapter,
//! the orchestrator account bound to it, the balance snapshot kept fresh by
//! a [`BalancePoller`], and the quote awaiting execution.

pub mod balance_poller;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::blockchain::Erc20Token;
use crate::execution::{ChainDeployment, ExecutionError, OrchestratorAccount, Quote};
use crate::providers::ProviderKind;
use crate::signer::{OrchestratorSigner, SignerAdapter, SignerError, SignerTransport};

pub use balance_poller::{BalancePoller, BalanceSnapshot, BalanceSource};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No session for {0}")]
    NotFound(Address),

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// What a new session is set up with.
#[derive(Clone)]
pub struct SessionSetup {
    pub deployments: Vec<ChainDeployment>,
    /// Chain the provider should be switched to.
    pub chain_id: u64,
    pub balance_source: Arc<dyn BalanceSource>,
    pub token: Erc20Token,
    pub poll_interval: Duration,
}

/// A quoted transfer waiting for execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    pub quote: Quote,
    pub recipients: Vec<Address>,
    pub amount: U256,
    pub total: U256,
    pub quoted_at: DateTime<Utc>,
}

/// One authenticated wallet.
pub struct WalletSession {
    id: Uuid,
    access_token: String,
    provider: ProviderKind,
    adapter: Arc<SignerAdapter<dyn SignerTransport>>,
    account: OrchestratorAccount,
    balances: Arc<RwLock<BalanceSnapshot>>,
    pending: Mutex<Option<PendingTransfer>>,
    created_at: DateTime<Utc>,
    cancel: CancellationToken,
}

impl WalletSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Bearer token handed to the client that created the session.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn authorizes(&self, token: &str) -> bool {
        self.access_token == token
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    pub fn address(&self) -> Address {
        self.adapter.address()
    }

    pub fn signer(&self) -> &Arc<dyn OrchestratorSigner> {
        self.account.signer()
    }

    pub fn account(&self) -> &OrchestratorAccount {
        &self.account
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub async fn balances(&self) -> BalanceSnapshot {
        self.balances.read().await.clone()
    }

    /// Replace the quote awaiting execution.
    pub async fn store_pending(&self, pending: PendingTransfer) {
        *self.pending.lock().await = Some(pending);
    }

    pub async fn pending(&self) -> Option<PendingTransfer> {
        self.pending.lock().await.clone()
    }

    /// Take the pending quote so it cannot be executed twice.
    pub async fn take_pending(&self) -> Option<PendingTransfer> {
        self.pending.lock().await.take()
    }

    /// Put a quote back after a failed attempt, unless a newer one exists.
    pub async fn restore_pending(&self, pending: PendingTransfer) {
        let mut slot = self.pending.lock().await;
        if slot.is_none() {
            *slot = Some(pending);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// All live sessions, keyed by address.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Address, Arc<WalletSession>>>,
    shutdown: CancellationToken,
}

impl SessionRegistry {
    /// Sessions are cancelled when `shutdown` is.
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            shutdown,
        }
    }

    /// Connect a provider. Returns the session and whether it was created;
    /// an address that already has a session gets the existing one back.
    pub async fn connect(
        &self,
        provider: ProviderKind,
        transport: Arc<dyn SignerTransport>,
        setup: SessionSetup,
    ) -> Result<(Arc<WalletSession>, bool), SessionError> {
        let adapter = Arc::new(SignerAdapter::connect(transport).await?);
        let address = adapter.address();

        if let Some(existing) = self.get(address).await {
            return Ok((existing, false));
        }

        adapter.ensure_chain(setup.chain_id).await?;

        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&address) {
            return Ok((existing.clone(), false));
        }

        let signer: Arc<dyn OrchestratorSigner> = adapter.clone();
        let account = OrchestratorAccount::new(signer, setup.deployments)?;

        let session = Arc::new(WalletSession {
            id: Uuid::new_v4(),
            access_token: new_access_token(),
            provider,
            adapter,
            account,
            balances: Arc::new(RwLock::new(BalanceSnapshot::default())),
            pending: Mutex::new(None),
            created_at: Utc::now(),
            cancel: self.shutdown.child_token(),
        });

        let poller = BalancePoller::new(
            address,
            setup.token,
            setup.balance_source,
            session.balances.clone(),
            setup.poll_interval,
        );
        tokio::spawn(poller.run(session.cancel.clone()));

        sessions.insert(address, session.clone());
        info!(
            session_id = %session.id,
            provider = %provider,
            address = %address,
            "Wallet session created"
        );

        Ok((session, true))
    }

    /// Live session for `address`. Sessions closed by shutdown are skipped.
    pub async fn get(&self, address: Address) -> Option<Arc<WalletSession>> {
        self.sessions
            .read()
            .await
            .get(&address)
            .filter(|session| !session.is_closed())
            .cloned()
    }

    pub async fn require(&self, address: Address) -> Result<Arc<WalletSession>, SessionError> {
        self.get(address)
            .await
            .ok_or(SessionError::NotFound(address))
    }

    /// Remove the session and stop its poller.
    ///
    /// A newer session for the same address is left alone.
    pub async fn disconnect(&self, session: &WalletSession) -> Result<(), SessionError> {
        let address = session.address();
        let mut sessions = self.sessions.write().await;
        match sessions.get(&address) {
            Some(current) if current.id == session.id => {
                sessions.remove(&address);
            }
            _ => return Err(SessionError::NotFound(address)),
        }
        drop(sessions);

        session.cancel.cancel();
        info!(session_id = %session.id, address = %address, "Wallet session closed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Stop every session's poller.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

fn new_access_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::balance_poller::tests::ScriptedBalances;
    use super::*;
    use std::sync::atomic::Ordering;

    use crate::blockchain::NetworkConfig;
    use crate::signer::adapter::tests::{alice, RecordingTransport};

    fn setup(source: Arc<ScriptedBalances>) -> SessionSetup {
        SessionSetup {
            deployments: vec![ChainDeployment {
                network: NetworkConfig::base_sepolia(),
                version: "2.1.0".to_string(),
            }],
            chain_id: 84532,
            balance_source: source,
            token: Erc20Token::usdc_base_sepolia(),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn connect_initializes_once_per_address() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let source = Arc::new(ScriptedBalances::default());

        let (first, created) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source.clone()),
            )
            .await
            .unwrap();
        assert!(created);
        assert_eq!(first.address(), alice());

        let (second, created) = registry
            .connect(
                ProviderKind::Local,
                Arc::new(RecordingTransport::new(alice())),
                setup(source),
            )
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(second.id(), first.id());
        assert_eq!(second.provider(), ProviderKind::Injected);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn connect_without_wallet_is_session_expired() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let transport = RecordingTransport::new(alice());
        *transport.address.lock().unwrap() = None;

        let result = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(transport),
                setup(Arc::new(ScriptedBalances::default())),
            )
            .await;
        assert!(matches!(
            result,
            Err(SessionError::Signer(SignerError::SessionExpired(_)))
        ));
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn disconnect_cancels_the_poller() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let source = Arc::new(ScriptedBalances::default());
        let (session, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source.clone()),
            )
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        registry.disconnect(&session).await.unwrap();
        assert!(session.is_closed());
        assert!(registry.get(alice()).await.is_none());

        tokio::time::sleep(Duration::from_millis(20)).await;
        let calls = source.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);

        assert!(matches!(
            registry.disconnect(&session).await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stale_handle_cannot_close_a_newer_session() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let source = Arc::new(ScriptedBalances::default());
        let (old, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source.clone()),
            )
            .await
            .unwrap();
        registry.disconnect(&old).await.unwrap();

        let (current, created) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source),
            )
            .await
            .unwrap();
        assert!(created);
        assert_ne!(current.id(), old.id());

        assert!(matches!(
            registry.disconnect(&old).await,
            Err(SessionError::NotFound(_))
        ));
        assert!(!current.is_closed());
        assert_eq!(registry.get(alice()).await.unwrap().id(), current.id());
    }

    #[tokio::test]
    async fn each_session_gets_its_own_access_token() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let source = Arc::new(ScriptedBalances::default());
        let (first, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source.clone()),
            )
            .await
            .unwrap();
        let token = first.access_token().to_string();
        assert_eq!(token.len(), 64);
        assert!(first.authorizes(&token));
        assert!(!first.authorizes(""));
        assert!(!first.authorizes(&first.id().simple().to_string()));

        registry.disconnect(&first).await.unwrap();
        let (second, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(source),
            )
            .await
            .unwrap();
        assert!(!second.authorizes(&token));
    }

    #[tokio::test]
    async fn shutdown_closes_every_session() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let (session, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(Arc::new(ScriptedBalances::default())),
            )
            .await
            .unwrap();

        registry.shutdown();
        assert!(session.is_closed());
        assert!(registry.get(alice()).await.is_none());
    }

    #[tokio::test]
    async fn pending_quote_is_taken_once() {
        let registry = SessionRegistry::new(CancellationToken::new());
        let (session, _) = registry
            .connect(
                ProviderKind::Injected,
                Arc::new(RecordingTransport::new(alice())),
                setup(Arc::new(ScriptedBalances::default())),
            )
            .await
            .unwrap();

        let pending = PendingTransfer {
            quote: crate::transfer::tests::sample_quote(),
            recipients: vec![Address::repeat_byte(1)],
            amount: U256::from(1u64),
            total: U256::from(1u64),
            quoted_at: Utc::now(),
        };
        session.store_pending(pending.clone()).await;

        assert_eq!(session.take_pending().await, Some(pending.clone()));
        assert!(session.take_pending().await.is_none());

        session.restore_pending(pending.clone()).await;
        assert_eq!(session.pending().await, Some(pending));
    }
}
