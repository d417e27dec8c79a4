// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet provider transports.
//!
//! One [`SignerTransport`](crate::signer::SignerTransport) per supported
//! provider kind, plus [`build_transport`] which turns a connect request and
//! the provider configuration into a ready transport.

pub mod embedded;
pub mod injected;
pub mod local;
pub mod rpc;
pub mod session_token;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{
    ProviderSettings, APP_WALLET_APP_ID_ENV, ENVIRONMENT_WALLET_ENVIRONMENT_ID_ENV,
    LOCAL_SIGNER_KEY_FILE_ENV, LOCAL_SIGNER_PRIVATE_KEY_ENV, SESSION_WALLET_API_KEY_ENV,
};
use crate::signer::{SignerError, SignerTransport};

pub use embedded::{EmbeddedScope, EmbeddedWalletTransport};
pub use injected::InjectedWalletTransport;
pub use local::LocalKeyTransport;
pub use session_token::SessionTokenTransport;

/// Supported wallet providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Browser-extension wallet reached through its EIP-1193 bridge
    Injected,
    /// Embedded wallet scoped by application id
    AppWallet,
    /// Embedded wallet scoped by environment id
    EnvironmentWallet,
    /// Session-token signing API
    SessionWallet,
    /// Development signer with a local key
    Local,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Injected,
        ProviderKind::AppWallet,
        ProviderKind::EnvironmentWallet,
        ProviderKind::SessionWallet,
        ProviderKind::Local,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Injected => "injected",
            ProviderKind::AppWallet => "app_wallet",
            ProviderKind::EnvironmentWallet => "environment_wallet",
            ProviderKind::SessionWallet => "session_wallet",
            ProviderKind::Local => "local",
        }
    }

    /// Configuration keys this provider needs that are not set.
    pub fn missing_keys(self, settings: &ProviderSettings) -> Vec<&'static str> {
        match self {
            ProviderKind::Injected => vec![],
            ProviderKind::AppWallet if settings.app_wallet.scope_id.is_none() => {
                vec![APP_WALLET_APP_ID_ENV]
            }
            ProviderKind::EnvironmentWallet
                if settings.environment_wallet.scope_id.is_none() =>
            {
                vec![ENVIRONMENT_WALLET_ENVIRONMENT_ID_ENV]
            }
            ProviderKind::SessionWallet if settings.session_wallet.api_key.is_none() => {
                vec![SESSION_WALLET_API_KEY_ENV]
            }
            ProviderKind::Local
                if settings.local.key_file.is_none() && settings.local.private_key.is_none() =>
            {
                vec![LOCAL_SIGNER_KEY_FILE_ENV, LOCAL_SIGNER_PRIVATE_KEY_ENV]
            }
            _ => vec![],
        }
    }

    /// Setup hint shown by the configuration panel.
    pub fn instructions(self) -> &'static str {
        match self {
            ProviderKind::Injected => {
                "Run the extension wallet bridge and pass its URL as `bridge_url` when connecting."
            }
            ProviderKind::AppWallet => {
                "Set APP_WALLET_APP_ID to the application id from the wallet dashboard."
            }
            ProviderKind::EnvironmentWallet => {
                "Set ENVIRONMENT_WALLET_ENVIRONMENT_ID to the environment id from the wallet dashboard."
            }
            ProviderKind::SessionWallet => {
                "Set SESSION_WALLET_API_KEY to the project API key of the session wallet service."
            }
            ProviderKind::Local => {
                "Set LOCAL_SIGNER_KEY_FILE (PKCS#8 PEM) or LOCAL_SIGNER_PRIVATE_KEY (hex). Development only."
            }
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-user credentials for connecting a provider session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderCredentials {
    Injected {
        /// URL of the extension wallet's JSON-RPC bridge
        bridge_url: String,
    },
    AppWallet {
        wallet_id: String,
        access_token: String,
    },
    EnvironmentWallet {
        wallet_id: String,
        access_token: String,
    },
    SessionWallet {
        session_token: String,
    },
    Local,
}

impl ProviderCredentials {
    pub fn kind(&self) -> ProviderKind {
        match self {
            ProviderCredentials::Injected { .. } => ProviderKind::Injected,
            ProviderCredentials::AppWallet { .. } => ProviderKind::AppWallet,
            ProviderCredentials::EnvironmentWallet { .. } => ProviderKind::EnvironmentWallet,
            ProviderCredentials::SessionWallet { .. } => ProviderKind::SessionWallet,
            ProviderCredentials::Local => ProviderKind::Local,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider {kind} is not configured (missing {})", .missing.join(", "))]
    NotConfigured {
        kind: ProviderKind,
        missing: Vec<&'static str>,
    },

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error(transparent)]
    Signer(#[from] SignerError),
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, ProviderError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ProviderError::MissingCredential(name))
    } else {
        Ok(value)
    }
}

/// Build the transport for a connect request.
pub fn build_transport(
    settings: &ProviderSettings,
    credentials: &ProviderCredentials,
) -> Result<Arc<dyn SignerTransport>, ProviderError> {
    let kind = credentials.kind();
    let missing = kind.missing_keys(settings);
    if !missing.is_empty() {
        return Err(ProviderError::NotConfigured { kind, missing });
    }

    let transport: Arc<dyn SignerTransport> = match credentials {
        ProviderCredentials::Injected { bridge_url } => Arc::new(InjectedWalletTransport::new(
            required(bridge_url, "bridge_url")?,
        )?),
        ProviderCredentials::AppWallet {
            wallet_id,
            access_token,
        } => Arc::new(EmbeddedWalletTransport::new(
            &settings.app_wallet.api_url,
            EmbeddedScope::App {
                app_id: settings.app_wallet.scope_id.clone().unwrap_or_default(),
            },
            required(wallet_id, "wallet_id")?,
            required(access_token, "access_token")?,
        )?),
        ProviderCredentials::EnvironmentWallet {
            wallet_id,
            access_token,
        } => Arc::new(EmbeddedWalletTransport::new(
            &settings.environment_wallet.api_url,
            EmbeddedScope::Environment {
                environment_id: settings
                    .environment_wallet
                    .scope_id
                    .clone()
                    .unwrap_or_default(),
            },
            required(wallet_id, "wallet_id")?,
            required(access_token, "access_token")?,
        )?),
        ProviderCredentials::SessionWallet { session_token } => {
            Arc::new(SessionTokenTransport::new(
                settings.session_wallet.api_url.clone(),
                settings.session_wallet.api_key.clone().unwrap_or_default(),
                required(session_token, "session_token")?,
            )?)
        }
        ProviderCredentials::Local => match (&settings.local.key_file, &settings.local.private_key) {
            (Some(path), _) => Arc::new(LocalKeyTransport::from_pem_file(path)?),
            (None, Some(key)) => Arc::new(LocalKeyTransport::from_hex(key)?),
            (None, None) => {
                return Err(ProviderError::NotConfigured {
                    kind,
                    missing: vec![LOCAL_SIGNER_KEY_FILE_ENV, LOCAL_SIGNER_PRIVATE_KEY_ENV],
                })
            }
        },
    };

    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn settings(pairs: &[(&'static str, &'static str)]) -> ProviderSettings {
        let pairs = pairs.to_vec();
        AppConfig::from_lookup(move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .providers
    }

    #[test]
    fn kinds_use_snake_case_names() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn credentials_are_tagged_by_provider() {
        let creds: ProviderCredentials = serde_json::from_value(serde_json::json!({
            "provider": "app_wallet",
            "wallet_id": "w1",
            "access_token": "t",
        }))
        .unwrap();
        assert_eq!(creds.kind(), ProviderKind::AppWallet);

        let creds: ProviderCredentials =
            serde_json::from_value(serde_json::json!({ "provider": "local" })).unwrap();
        assert_eq!(creds.kind(), ProviderKind::Local);
    }

    #[test]
    fn unconfigured_providers_report_missing_keys() {
        let s = settings(&[]);
        assert!(ProviderKind::Injected.missing_keys(&s).is_empty());
        assert_eq!(ProviderKind::AppWallet.missing_keys(&s), vec![APP_WALLET_APP_ID_ENV]);
        assert_eq!(
            ProviderKind::SessionWallet.missing_keys(&s),
            vec![SESSION_WALLET_API_KEY_ENV]
        );
        assert_eq!(ProviderKind::Local.missing_keys(&s).len(), 2);

        let err = build_transport(
            &s,
            &ProviderCredentials::AppWallet {
                wallet_id: "w".into(),
                access_token: "t".into(),
            },
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProviderError::NotConfigured { kind: ProviderKind::AppWallet, .. }));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let s = settings(&[(SESSION_WALLET_API_KEY_ENV, "key")]);
        let err = build_transport(
            &s,
            &ProviderCredentials::SessionWallet {
                session_token: "  ".into(),
            },
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProviderError::MissingCredential("session_token")));
    }

    #[test]
    fn each_configured_provider_builds() {
        let s = settings(&[
            (APP_WALLET_APP_ID_ENV, "app"),
            (ENVIRONMENT_WALLET_ENVIRONMENT_ID_ENV, "env"),
            (SESSION_WALLET_API_KEY_ENV, "key"),
            (LOCAL_SIGNER_PRIVATE_KEY_ENV, ANVIL_KEY),
        ]);

        let cases = [
            ProviderCredentials::Injected {
                bridge_url: "http://127.0.0.1:8545".into(),
            },
            ProviderCredentials::AppWallet {
                wallet_id: "w".into(),
                access_token: "t".into(),
            },
            ProviderCredentials::EnvironmentWallet {
                wallet_id: "w".into(),
                access_token: "t".into(),
            },
            ProviderCredentials::SessionWallet {
                session_token: "s".into(),
            },
            ProviderCredentials::Local,
        ];

        for creds in cases {
            let transport = build_transport(&s, &creds).unwrap();
            assert_eq!(transport.label(), creds.kind().as_str());
        }
    }
}
