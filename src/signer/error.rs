// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signer errors shared by every provider transport.

/// Errors surfaced by a signer adapter or its underlying transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignerError {
    /// The user declined the request in the provider UI.
    #[error("Signing rejected: {0}")]
    SigningRejected(String),

    /// The provider session is missing, invalid, or belongs to another address.
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// The adapter does not offer this capability.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The provider could not be reached or answered with a transport failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The payload could not be encoded for the provider.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Any other provider-reported failure.
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },
}

impl SignerError {
    /// Stable machine-readable code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            SignerError::SigningRejected(_) => "signing_rejected",
            SignerError::SessionExpired(_) => "session_expired",
            SignerError::UnsupportedOperation(_) => "unsupported_operation",
            SignerError::Network(_) => "network_error",
            SignerError::InvalidPayload(_) => "invalid_payload",
            SignerError::Provider { .. } => "provider_error",
        }
    }

    /// Whether the user can retry the same action without reconnecting.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SignerError::SigningRejected(_) | SignerError::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            SignerError::SigningRejected("no".into()).error_code(),
            "signing_rejected"
        );
        assert_eq!(
            SignerError::SessionExpired("gone".into()).error_code(),
            "session_expired"
        );
        assert_eq!(
            SignerError::Provider {
                code: -32000,
                message: "boom".into()
            }
            .error_code(),
            "provider_error"
        );
    }

    #[test]
    fn only_rejection_and_network_are_retryable() {
        assert!(SignerError::SigningRejected("x".into()).is_retryable());
        assert!(SignerError::Network("x".into()).is_retryable());
        assert!(!SignerError::SessionExpired("x".into()).is_retryable());
        assert!(!SignerError::UnsupportedOperation("x".into()).is_retryable());
    }
}
