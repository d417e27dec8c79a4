// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Poller
//!
//! Background task that refreshes a session's native and transfer-token
//! balances on a fixed interval. A failed refresh keeps the last known
//! balances, records the error in the snapshot and waits for the next tick;
//! there is no retry in between.
//!
//! ## Shutdown
//!
//! Runs until its `CancellationToken` fires. Each session owns a child of the
//! server shutdown token, so both disconnect and server shutdown stop it.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::blockchain::{ChainClient, ChainClientError, Erc20Token, TokenBalance};

/// Where balances are read from.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn native_balance(&self, owner: Address) -> Result<TokenBalance, ChainClientError>;

    async fn token_balance(
        &self,
        owner: Address,
        token: &Erc20Token,
    ) -> Result<TokenBalance, ChainClientError>;
}

#[async_trait]
impl BalanceSource for ChainClient {
    async fn native_balance(&self, owner: Address) -> Result<TokenBalance, ChainClientError> {
        self.get_native_balance(owner).await
    }

    async fn token_balance(
        &self,
        owner: Address,
        token: &Erc20Token,
    ) -> Result<TokenBalance, ChainClientError> {
        self.get_token_balance(owner, token).await
    }
}

/// Last known balances of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct BalanceSnapshot {
    /// Native token balance
    pub native: Option<TokenBalance>,
    /// Transfer token balance
    pub token: Option<TokenBalance>,
    /// When the last successful refresh finished
    pub updated_at: Option<DateTime<Utc>>,
    /// Error of the most recent refresh, cleared on success
    pub last_error: Option<String>,
}

/// Periodic balance refresher for one address.
pub struct BalancePoller {
    owner: Address,
    token: Erc20Token,
    source: Arc<dyn BalanceSource>,
    snapshot: Arc<RwLock<BalanceSnapshot>>,
    poll_interval: Duration,
}

impl BalancePoller {
    pub fn new(
        owner: Address,
        token: Erc20Token,
        source: Arc<dyn BalanceSource>,
        snapshot: Arc<RwLock<BalanceSnapshot>>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            owner,
            token,
            source,
            snapshot,
            poll_interval,
        }
    }

    /// Run until `shutdown` is cancelled. Polls immediately, then on every
    /// interval.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            owner = %self.owner,
            interval_secs = self.poll_interval.as_secs(),
            "Balance poller starting"
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            self.poll_step().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => break,
            }
        }

        info!(owner = %self.owner, "Balance poller stopped");
    }

    /// Refresh both balances once.
    pub async fn poll_step(&self) {
        let native = self.source.native_balance(self.owner).await;
        let token = self.source.token_balance(self.owner, &self.token).await;

        let mut snapshot = self.snapshot.write().await;
        match (native, token) {
            (Ok(native), Ok(token)) => {
                debug!(
                    owner = %self.owner,
                    native = %native.balance_formatted,
                    token = %token.balance_formatted,
                    "Balances refreshed"
                );
                snapshot.native = Some(native);
                snapshot.token = Some(token);
                snapshot.updated_at = Some(Utc::now());
                snapshot.last_error = None;
            }
            (native, token) => {
                let mut errors = Vec::new();
                match native {
                    Ok(balance) => snapshot.native = Some(balance),
                    Err(e) => errors.push(format!("native balance: {e}")),
                }
                match token {
                    Ok(balance) => snapshot.token = Some(balance),
                    Err(e) => errors.push(format!("{} balance: {e}", self.token.symbol)),
                }
                let message = errors.join("; ");
                warn!(owner = %self.owner, error = %message, "Balance refresh failed");
                snapshot.last_error = Some(message);
            }
        }
    }
}
