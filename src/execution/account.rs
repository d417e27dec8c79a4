// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Orchestrator account handle.
//!
//! The execution service derives and deploys the companion account itself;
//! this handle only carries the end-user signer and the chains (with their
//! RPC endpoint and account protocol version) the account operates on.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::Address;
use serde::Serialize;

use super::client::ExecutionError;
use crate::blockchain::NetworkConfig;
use crate::signer::OrchestratorSigner;

/// One chain the orchestrator account is deployed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDeployment {
    pub network: NetworkConfig,
    /// Account protocol version.
    pub version: String,
}

/// Wire description of the account sent with quote requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountDescriptor {
    pub owner: Address,
    pub deployments: Vec<DeploymentDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentDescriptor {
    pub chain_id: u64,
    pub version: String,
}

/// Orchestrator account bound to an end-user signer.
pub struct OrchestratorAccount {
    signer: Arc<dyn OrchestratorSigner>,
    deployments: Vec<ChainDeployment>,
}

impl std::fmt::Debug for OrchestratorAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorAccount")
            .field("owner", &self.signer.address())
            .field("deployments", &self.deployments)
            .finish()
    }
}

impl OrchestratorAccount {
    /// Bind `signer` to the given deployments. At least one deployment is
    /// required and chain ids must be unique.
    pub fn new(
        signer: Arc<dyn OrchestratorSigner>,
        deployments: Vec<ChainDeployment>,
    ) -> Result<Self, ExecutionError> {
        if deployments.is_empty() {
            return Err(ExecutionError::InvalidRequest(
                "an orchestrator account needs at least one chain".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = deployments
            .iter()
            .find(|d| !seen.insert(d.network.chain_id))
        {
            return Err(ExecutionError::InvalidRequest(format!(
                "chain {} is listed twice",
                dup.network.chain_id
            )));
        }

        Ok(Self {
            signer,
            deployments,
        })
    }

    /// End-user address that owns the account.
    pub fn owner(&self) -> Address {
        self.signer.address()
    }

    pub fn signer(&self) -> &Arc<dyn OrchestratorSigner> {
        &self.signer
    }

    pub fn deployments(&self) -> &[ChainDeployment] {
        &self.deployments
    }

    pub fn deployment(&self, chain_id: u64) -> Option<&ChainDeployment> {
        self.deployments
            .iter()
            .find(|d| d.network.chain_id == chain_id)
    }

    pub fn supports(&self, chain_id: u64) -> bool {
        self.deployment(chain_id).is_some()
    }

    pub fn descriptor(&self) -> AccountDescriptor {
        AccountDescriptor {
            owner: self.owner(),
            deployments: self
                .deployments
                .iter()
                .map(|d| DeploymentDescriptor {
                    chain_id: d.network.chain_id,
                    version: d.version.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::adapter::tests::{alice, RecordingTransport};
    use crate::signer::SignerAdapter;

    fn signer() -> Arc<dyn OrchestratorSigner> {
        Arc::new(SignerAdapter::with_address(
            alice(),
            Arc::new(RecordingTransport::new(alice())),
        ))
    }

    fn deployment(network: NetworkConfig) -> ChainDeployment {
        ChainDeployment {
            network,
            version: "2.1.0".to_string(),
        }
    }

    #[test]
    fn account_requires_a_chain() {
        assert!(OrchestratorAccount::new(signer(), vec![]).is_err());
    }

    #[test]
    fn duplicate_chains_are_rejected() {
        let result = OrchestratorAccount::new(
            signer(),
            vec![
                deployment(NetworkConfig::base_sepolia()),
                deployment(NetworkConfig::base_sepolia()),
            ],
        );
        assert!(matches!(result, Err(ExecutionError::InvalidRequest(_))));
    }

    #[test]
    fn descriptor_lists_owner_and_chains() {
        let account = OrchestratorAccount::new(
            signer(),
            vec![
                deployment(NetworkConfig::base_sepolia()),
                deployment(NetworkConfig::optimism_sepolia()),
            ],
        )
        .unwrap();

        assert_eq!(account.owner(), alice());
        assert!(account.supports(84532));
        assert!(!account.supports(1));

        let descriptor = account.descriptor();
        assert_eq!(descriptor.deployments.len(), 2);
        assert_eq!(descriptor.deployments[1].chain_id, 11155420);
        assert_eq!(descriptor.deployments[0].version, "2.1.0");
    }
}
