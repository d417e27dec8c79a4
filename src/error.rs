// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::blockchain::ChainClientError;
use crate::config::ConfigError;
use crate::execution::ExecutionError;
use crate::providers::ProviderError;
use crate::session::SessionError;
use crate::signer::SignerError;
use crate::transfer::TransferError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Machine-readable signer failure kind
    pub code: Option<&'static str>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            code: self.code,
        });
        (self.status, body).into_response()
    }
}

impl From<SignerError> for ApiError {
    fn from(err: SignerError) -> Self {
        let message = err.to_string();
        let api = match &err {
            SignerError::SigningRejected(_) => Self::conflict(message),
            SignerError::SessionExpired(_) => Self::unauthorized(message),
            SignerError::UnsupportedOperation(_) => {
                error!(error = %message, "Unsupported signer operation requested");
                Self::internal(message)
            }
            SignerError::InvalidPayload(_) => Self::unprocessable(message),
            SignerError::Network(_) | SignerError::Provider { .. } => {
                warn!(
                    error = %message,
                    retryable = err.is_retryable(),
                    "Wallet provider call failed"
                );
                Self::bad_gateway(message)
            }
        };
        api.with_code(err.error_code())
    }
}

impl From<ExecutionError> for ApiError {
    fn from(err: ExecutionError) -> Self {
        match err {
            ExecutionError::Signer(e) => e.into(),
            ExecutionError::InvalidRequest(message) => Self::unprocessable(message),
            ExecutionError::Timeout { .. } => {
                warn!(error = %err, "Execution receipt wait timed out");
                Self::new(StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            other => {
                warn!(error = %other, "Execution service call failed");
                Self::bad_gateway(other.to_string())
            }
        }
    }
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::Execution(e) => e.into(),
            other => Self::bad_request(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        Self::service_unavailable(err.to_string())
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured { .. } => Self::service_unavailable(err.to_string()),
            ProviderError::MissingCredential(_) => Self::bad_request(err.to_string()),
            ProviderError::Signer(e) => e.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => Self::not_found(err.to_string()),
            SessionError::Signer(e) => e.into(),
            SessionError::Execution(e) => e.into(),
        }
    }
}

impl From<ChainClientError> for ApiError {
    fn from(err: ChainClientError) -> Self {
        match err {
            ChainClientError::InvalidAddress(_) | ChainClientError::InvalidAmount(_) => {
                Self::bad_request(err.to_string())
            }
            other => {
                warn!(error = %other, "Chain read failed");
                Self::bad_gateway(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(unp.message, "oops");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn signer_errors_map_to_statuses() {
        let cases = [
            (SignerError::SigningRejected("no".into()), StatusCode::CONFLICT),
            (SignerError::SessionExpired("gone".into()), StatusCode::UNAUTHORIZED),
            (
                SignerError::UnsupportedOperation("tx".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (SignerError::Network("down".into()), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            let code = err.error_code();
            let api = ApiError::from(err);
            assert_eq!(api.status, status);
            assert_eq!(api.code, Some(code));
        }
    }

    #[tokio::test]
    async fn signer_errors_carry_a_code_in_the_body() {
        let response =
            ApiError::from(SignerError::SigningRejected("declined".into())).into_response();
        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["code"], SignerError::SigningRejected(String::new()).error_code());
    }

    #[test]
    fn nested_signer_errors_keep_their_status() {
        let err = TransferError::Execution(ExecutionError::Signer(SignerError::SigningRejected(
            "declined".into(),
        )));
        assert_eq!(ApiError::from(err).status, StatusCode::CONFLICT);

        let err = SessionError::Signer(SignerError::SessionExpired("gone".into()));
        assert_eq!(ApiError::from(err).status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn config_and_timeout_statuses() {
        let err = ConfigError {
            missing: vec!["EXECUTION_API_KEY"],
        };
        let api = ApiError::from(err);
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(api.message.contains("EXECUTION_API_KEY"));

        let err = ExecutionError::Timeout {
            hash: "0x01".into(),
            waited_secs: 300,
        };
        assert_eq!(ApiError::from(err).status, StatusCode::GATEWAY_TIMEOUT);

        assert_eq!(
            ApiError::from(TransferError::NoRecipients).status,
            StatusCode::BAD_REQUEST
        );
    }
}
