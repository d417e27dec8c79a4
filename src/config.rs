// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the parsed [`AppConfig`].
//! Configuration is loaded once at startup. A missing or malformed key never
//! aborts the process: it is recorded as a [`ConfigIssue`], surfaced by the
//! `/v1/config` status panel, and the routes depending on it answer `503`.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `EXECUTION_API_URL` | Execution service base URL | `http://127.0.0.1:4000` |
//! | `EXECUTION_API_KEY` | Execution service API key | Required |
//! | `CHAIN_ID` | Chain transfers run on | `84532` |
//! | `CHAIN_RPC_URL` | JSON-RPC endpoint for balances | Network default |
//! | `ACCOUNT_VERSION` | Orchestrator account protocol version | `2.1.0` |
//! | `TRANSFER_TOKEN_ADDRESS` | Token moved by transfers | Base Sepolia USDC |
//! | `TRANSFER_TOKEN_SYMBOL` | Display symbol of the transfer token | `USDC` |
//! | `TRANSFER_TOKEN_DECIMALS` | Decimals of the transfer token | `6` |
//! | `FEE_TOKEN_ADDRESS` | Token paying execution fees | Transfer token |
//! | `BALANCE_POLL_INTERVAL_SECS` | Balance refresh interval | `10` |
//! | `RECEIPT_POLL_INTERVAL_SECS` | Receipt poll interval | `3` |
//! | `RECEIPT_TIMEOUT_SECS` | Receipt wait limit | `300` |
//! | `APP_WALLET_API_URL` | App-scoped embedded wallet API | `http://127.0.0.1:4100` |
//! | `APP_WALLET_APP_ID` | Application id | Required for `app_wallet` |
//! | `ENVIRONMENT_WALLET_API_URL` | Environment-scoped embedded wallet API | `http://127.0.0.1:4200` |
//! | `ENVIRONMENT_WALLET_ENVIRONMENT_ID` | Environment id | Required for `environment_wallet` |
//! | `SESSION_WALLET_API_URL` | Session-token wallet API | `http://127.0.0.1:4300` |
//! | `SESSION_WALLET_API_KEY` | Session-token wallet API key | Required for `session_wallet` |
//! | `LOCAL_SIGNER_KEY_FILE` | PEM key for the development signer | Optional |
//! | `LOCAL_SIGNER_PRIVATE_KEY` | Hex key for the development signer | Optional |

use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::{Erc20Token, NetworkConfig, MAX_TOKEN_DECIMALS, USDC_BASE_SEPOLIA};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const EXECUTION_API_URL_ENV: &str = "EXECUTION_API_URL";
pub const EXECUTION_API_KEY_ENV: &str = "EXECUTION_API_KEY";

pub const CHAIN_ID_ENV: &str = "CHAIN_ID";
pub const CHAIN_RPC_URL_ENV: &str = "CHAIN_RPC_URL";
pub const ACCOUNT_VERSION_ENV: &str = "ACCOUNT_VERSION";
pub const TRANSFER_TOKEN_ADDRESS_ENV: &str = "TRANSFER_TOKEN_ADDRESS";
pub const TRANSFER_TOKEN_SYMBOL_ENV: &str = "TRANSFER_TOKEN_SYMBOL";
pub const TRANSFER_TOKEN_DECIMALS_ENV: &str = "TRANSFER_TOKEN_DECIMALS";
pub const FEE_TOKEN_ADDRESS_ENV: &str = "FEE_TOKEN_ADDRESS";

pub const BALANCE_POLL_INTERVAL_ENV: &str = "BALANCE_POLL_INTERVAL_SECS";
pub const RECEIPT_POLL_INTERVAL_ENV: &str = "RECEIPT_POLL_INTERVAL_SECS";
pub const RECEIPT_TIMEOUT_ENV: &str = "RECEIPT_TIMEOUT_SECS";

pub const APP_WALLET_API_URL_ENV: &str = "APP_WALLET_API_URL";
pub const APP_WALLET_APP_ID_ENV: &str = "APP_WALLET_APP_ID";
pub const ENVIRONMENT_WALLET_API_URL_ENV: &str = "ENVIRONMENT_WALLET_API_URL";
pub const ENVIRONMENT_WALLET_ENVIRONMENT_ID_ENV: &str = "ENVIRONMENT_WALLET_ENVIRONMENT_ID";
pub const SESSION_WALLET_API_URL_ENV: &str = "SESSION_WALLET_API_URL";
pub const SESSION_WALLET_API_KEY_ENV: &str = "SESSION_WALLET_API_KEY";
pub const LOCAL_SIGNER_KEY_FILE_ENV: &str = "LOCAL_SIGNER_KEY_FILE";
pub const LOCAL_SIGNER_PRIVATE_KEY_ENV: &str = "LOCAL_SIGNER_PRIVATE_KEY";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_EXECUTION_API_URL: &str = "http://127.0.0.1:4000";
const DEFAULT_ACCOUNT_VERSION: &str = "2.1.0";
const DEFAULT_BALANCE_POLL_SECS: u64 = 10;
const DEFAULT_RECEIPT_POLL_SECS: u64 = 3;
const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_APP_WALLET_API_URL: &str = "http://127.0.0.1:4100";
const DEFAULT_ENVIRONMENT_WALLET_API_URL: &str = "http://127.0.0.1:4200";
const DEFAULT_SESSION_WALLET_API_URL: &str = "http://127.0.0.1:4300";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// A configuration key that is missing or could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConfigIssue {
    /// Environment variable name
    pub key: String,
    /// What is wrong with it
    pub message: String,
}

impl ConfigIssue {
    fn missing(key: &str) -> Self {
        Self {
            key: key.to_string(),
            message: "not set".to_string(),
        }
    }

    fn invalid(key: &str, detail: impl std::fmt::Display) -> Self {
        Self {
            key: key.to_string(),
            message: format!("invalid value: {detail}"),
        }
    }
}

/// Error returned when a route needs configuration that is absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing configuration: {}", .missing.join(", "))]
pub struct ConfigError {
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub network: NetworkConfig,
    pub account_version: String,
    pub transfer_token: Erc20Token,
    pub fee_token: Address,
    pub balance_poll_interval: Duration,
}

/// Embedded wallet API settings. `scope_id` is the app or environment id.
#[derive(Debug, Clone)]
pub struct EmbeddedWalletSettings {
    pub api_url: String,
    pub scope_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionWalletSettings {
    pub api_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LocalSignerSettings {
    pub key_file: Option<PathBuf>,
    pub private_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub app_wallet: EmbeddedWalletSettings,
    pub environment_wallet: EmbeddedWalletSettings,
    pub session_wallet: SessionWalletSettings,
    pub local: LocalSignerSettings,
}

/// Parsed runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub execution: ExecutionSettings,
    pub chain: ChainSettings,
    pub providers: ProviderSettings,
    /// Keys that were present but malformed. Defaults were used instead.
    pub issues: Vec<ConfigIssue>,
}

/// Reads keys from a lookup function, treating blank values as unset and
/// collecting parse failures.
struct Reader<F> {
    lookup: F,
    issues: Vec<ConfigIssue>,
}

impl<F: Fn(&str) -> Option<String>> Reader<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&mut self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.string(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                self.issues.push(ConfigIssue::invalid(key, e));
                None
            }
        }
    }

    fn url_or(&mut self, key: &str, default: &str) -> String {
        match self.string(key) {
            Some(raw) => match url::Url::parse(&raw) {
                Ok(_) => raw,
                Err(e) => {
                    self.issues.push(ConfigIssue::invalid(key, e));
                    default.to_string()
                }
            },
            None => default.to_string(),
        }
    }

    fn decimals_or(&mut self, key: &str, default: u8) -> u8 {
        match self.parsed::<u8>(key) {
            Some(decimals) if decimals > MAX_TOKEN_DECIMALS => {
                self.issues.push(ConfigIssue::invalid(
                    key,
                    format!("must be at most {MAX_TOKEN_DECIMALS}"),
                ));
                default
            }
            Some(decimals) => decimals,
            None => default,
        }
    }

    fn secs_or(&mut self, key: &str, default: u64) -> Duration {
        match self.parsed::<u64>(key) {
            Some(0) => {
                self.issues
                    .push(ConfigIssue::invalid(key, "must be greater than zero"));
                Duration::from_secs(default)
            }
            Some(secs) => Duration::from_secs(secs),
            None => Duration::from_secs(default),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut r = Reader {
            lookup,
            issues: Vec::new(),
        };

        let log_format = match r.string(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                r.issues.push(ConfigIssue::invalid(
                    LOG_FORMAT_ENV,
                    format!("`{other}` (expected json or pretty)"),
                ));
                LogFormat::Pretty
            }
        };

        let host = r.string_or(HOST_ENV, DEFAULT_HOST);
        let port = r.parsed(PORT_ENV).unwrap_or(DEFAULT_PORT);

        let execution = ExecutionSettings {
            api_url: r.url_or(EXECUTION_API_URL_ENV, DEFAULT_EXECUTION_API_URL),
            api_key: r.string(EXECUTION_API_KEY_ENV),
            receipt_poll_interval: r.secs_or(RECEIPT_POLL_INTERVAL_ENV, DEFAULT_RECEIPT_POLL_SECS),
            receipt_timeout: r.secs_or(RECEIPT_TIMEOUT_ENV, DEFAULT_RECEIPT_TIMEOUT_SECS),
        };

        let chain_id = r
            .parsed::<u64>(CHAIN_ID_ENV)
            .unwrap_or(NetworkConfig::base_sepolia().chain_id);
        let mut network = NetworkConfig::known(chain_id).unwrap_or_else(|| NetworkConfig {
            name: format!("Chain {chain_id}"),
            chain_id,
            rpc_url: String::new(),
            explorer_url: String::new(),
        });
        if let Some(rpc_url) = r.string(CHAIN_RPC_URL_ENV) {
            match url::Url::parse(&rpc_url) {
                Ok(_) => network.rpc_url = rpc_url,
                Err(e) => r.issues.push(ConfigIssue::invalid(CHAIN_RPC_URL_ENV, e)),
            }
        }

        let token_address = r
            .parsed::<Address>(TRANSFER_TOKEN_ADDRESS_ENV)
            .unwrap_or(USDC_BASE_SEPOLIA);
        let default_token = Erc20Token::usdc_base_sepolia();
        let transfer_token = Erc20Token {
            symbol: r.string_or(TRANSFER_TOKEN_SYMBOL_ENV, &default_token.symbol),
            name: if token_address == default_token.address {
                default_token.name.clone()
            } else {
                "Transfer token".to_string()
            },
            decimals: r.decimals_or(TRANSFER_TOKEN_DECIMALS_ENV, default_token.decimals),
            address: token_address,
        };
        let fee_token = r
            .parsed::<Address>(FEE_TOKEN_ADDRESS_ENV)
            .unwrap_or(transfer_token.address);

        let chain = ChainSettings {
            network,
            account_version: r.string_or(ACCOUNT_VERSION_ENV, DEFAULT_ACCOUNT_VERSION),
            transfer_token,
            fee_token,
            balance_poll_interval: r.secs_or(BALANCE_POLL_INTERVAL_ENV, DEFAULT_BALANCE_POLL_SECS),
        };

        let providers = ProviderSettings {
            app_wallet: EmbeddedWalletSettings {
                api_url: r.url_or(APP_WALLET_API_URL_ENV, DEFAULT_APP_WALLET_API_URL),
                scope_id: r.string(APP_WALLET_APP_ID_ENV),
            },
            environment_wallet: EmbeddedWalletSettings {
                api_url: r.url_or(
                    ENVIRONMENT_WALLET_API_URL_ENV,
                    DEFAULT_ENVIRONMENT_WALLET_API_URL,
                ),
                scope_id: r.string(ENVIRONMENT_WALLET_ENVIRONMENT_ID_ENV),
            },
            session_wallet: SessionWalletSettings {
                api_url: r.url_or(SESSION_WALLET_API_URL_ENV, DEFAULT_SESSION_WALLET_API_URL),
                api_key: r.string(SESSION_WALLET_API_KEY_ENV),
            },
            local: LocalSignerSettings {
                key_file: r.string(LOCAL_SIGNER_KEY_FILE_ENV).map(PathBuf::from),
                private_key: r.string(LOCAL_SIGNER_PRIVATE_KEY_ENV),
            },
        };

        Self {
            host,
            port,
            log_format,
            execution,
            chain,
            providers,
            issues: r.issues,
        }
    }

    /// Keys the execution routes need but are not set.
    pub fn missing_execution_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.execution.api_key.is_none() {
            missing.push(EXECUTION_API_KEY_ENV);
        }
        if self.chain.network.rpc_url.is_empty() {
            missing.push(CHAIN_RPC_URL_ENV);
        }
        missing
    }

    /// Fail with the missing keys when execution is not configured.
    pub fn require_execution(&self) -> Result<&str, ConfigError> {
        let missing = self.missing_execution_keys();
        match (&self.execution.api_key, missing.is_empty()) {
            (Some(key), true) => Ok(key),
            _ => Err(ConfigError { missing }),
        }
    }

    /// Missing and malformed keys, for the status panel.
    pub fn all_issues(&self) -> Vec<ConfigIssue> {
        self.missing_execution_keys()
            .into_iter()
            .map(ConfigIssue::missing)
            .chain(self.issues.iter().cloned())
            .collect()
    }
}
