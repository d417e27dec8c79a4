// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::blockchain::ChainClient;
use crate::config::{AppConfig, ConfigError};
use crate::execution::{ChainDeployment, ExecutionClient, HttpExecutionClient};
use crate::session::{BalanceSource, SessionRegistry, SessionSetup};
use crate::transfer::TransferSettings;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionRegistry>,
    execution: Option<Arc<dyn ExecutionClient>>,
    balances: Option<Arc<dyn BalanceSource>>,
}

impl AppState {
    /// Build the state from configuration. Clients whose configuration is
    /// missing are left out and the routes needing them answer `503`.
    pub fn from_config(config: AppConfig, shutdown: CancellationToken) -> Self {
        let execution = match config.require_execution() {
            Ok(api_key) => match HttpExecutionClient::new(config.execution.api_url.clone(), api_key) {
                Ok(client) => Some(Arc::new(client.with_receipt_polling(
                    config.execution.receipt_poll_interval,
                    config.execution.receipt_timeout,
                )) as Arc<dyn ExecutionClient>),
                Err(e) => {
                    warn!(error = %e, "Execution client unavailable");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Execution client not configured");
                None
            }
        };

        let balances = match ChainClient::new(config.chain.network.clone()) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn BalanceSource>),
            Err(e) => {
                warn!(error = %e, "Chain client unavailable");
                None
            }
        };

        Self::with_clients(config, execution, balances, shutdown)
    }

    pub fn with_clients(
        config: AppConfig,
        execution: Option<Arc<dyn ExecutionClient>>,
        balances: Option<Arc<dyn BalanceSource>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new(shutdown)),
            execution,
            balances,
        }
    }

    fn not_configured(&self) -> ConfigError {
        ConfigError {
            missing: self.config.missing_execution_keys(),
        }
    }

    pub fn execution(&self) -> Result<Arc<dyn ExecutionClient>, ConfigError> {
        self.execution.clone().ok_or_else(|| self.not_configured())
    }

    pub fn is_execution_ready(&self) -> bool {
        self.execution.is_some() && self.balances.is_some()
    }

    /// Everything a new session is created with.
    pub fn session_setup(&self) -> Result<SessionSetup, ConfigError> {
        let balance_source = self.balances.clone().ok_or_else(|| self.not_configured())?;
        let chain = &self.config.chain;
        Ok(SessionSetup {
            deployments: vec![ChainDeployment {
                network: chain.network.clone(),
                version: chain.account_version.clone(),
            }],
            chain_id: chain.network.chain_id,
            balance_source,
            token: chain.transfer_token.clone(),
            poll_interval: chain.balance_poll_interval,
        })
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            chain_id: self.config.chain.network.chain_id,
            token: self.config.chain.transfer_token.address,
            fee_token: self.config.chain.fee_token,
        }
    }
}
