// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use alloy::primitives::Address;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::{ConfigIssue, LogFormat},
    error::ApiError,
    models::{
        BalanceResponse, ChainTransactionResponse, ConfigStatusResponse, ExecuteResponse,
        MessageEncoding, ProviderStatus, QuoteResponse, SessionResponse, SignMessageRequest,
        SignTypedDataRequest, SignatureResponse, TransferQuoteRequest, TypedDomainInput,
    },
    providers::{ProviderCredentials, ProviderKind},
    session::{BalanceSnapshot, WalletSession},
    signer::SignerError,
    state::AppState,
};

pub mod auth;
pub mod health;
pub mod sessions;
pub mod signing;
pub mod transfers;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/config", get(health::config_status))
        .route("/sessions", post(sessions::connect_session))
        .route(
            "/sessions/{address}",
            get(sessions::get_session).delete(sessions::disconnect_session),
        )
        .route("/sessions/{address}/balance", get(sessions::get_balance))
        .route("/sessions/{address}/sign/message", post(signing::sign_message))
        .route(
            "/sessions/{address}/sign/typed-data",
            post(signing::sign_typed_data),
        )
        .route("/sessions/{address}/transfers/quote", post(transfers::quote))
        .route(
            "/sessions/{address}/transfers/execute",
            post(transfers::execute),
        );

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Parse an address path segment.
pub(crate) fn parse_address(raw: &str) -> Result<Address, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid address: {raw}")))
}

/// Map a signer error, closing the session when the wallet is no longer
/// authenticated as its address.
pub(crate) async fn signer_failure(
    state: &AppState,
    session: &WalletSession,
    err: SignerError,
) -> ApiError {
    if matches!(err, SignerError::SessionExpired(_))
        && state.sessions.disconnect(session).await.is_ok()
    {
        info!(
            session_id = %session.id(),
            address = %session.address(),
            "Wallet session expired, closed"
        );
    }
    err.into()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::config_status,
        sessions::connect_session,
        sessions::get_session,
        sessions::disconnect_session,
        sessions::get_balance,
        signing::sign_message,
        signing::sign_typed_data,
        transfers::quote,
        transfers::execute
    ),
    components(
        schemas(
            health::HealthResponse,
            ConfigStatusResponse,
            ProviderStatus,
            ConfigIssue,
            LogFormat,
            ProviderKind,
            ProviderCredentials,
            SessionResponse,
            BalanceResponse,
            BalanceSnapshot,
            MessageEncoding,
            SignMessageRequest,
            TypedDomainInput,
            SignTypedDataRequest,
            SignatureResponse,
            TransferQuoteRequest,
            QuoteResponse,
            ExecuteResponse,
            ChainTransactionResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and configuration status"),
        (name = "Sessions", description = "Wallet provider sessions"),
        (name = "Signing", description = "Signatures through the signer adapter"),
        (name = "Transfers", description = "Batched token transfers")
    )
)]
struct ApiDoc;

/// Registers the session access token as the `bearer_auth` scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use alloy::primitives::Signature;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::config::{AppConfig, EXECUTION_API_KEY_ENV, LOCAL_SIGNER_PRIVATE_KEY_ENV};
    use crate::session::balance_poller::tests::ScriptedBalances;
    use crate::transfer::tests::RecordingExecutionClient;

    const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const BOB: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
    const CAROL: &str = "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC";

    fn app(with_execution: bool) -> (Router, Arc<RecordingExecutionClient>) {
        let config = AppConfig::from_lookup(|key| match key {
            EXECUTION_API_KEY_ENV => Some("test-key".to_string()),
            LOCAL_SIGNER_PRIVATE_KEY_ENV => Some(ANVIL_KEY.to_string()),
            _ => None,
        });
        let execution = Arc::new(RecordingExecutionClient::default());
        let state = AppState::with_clients(
            config,
            with_execution.then(|| execution.clone() as Arc<dyn crate::execution::ExecutionClient>),
            Some(Arc::new(ScriptedBalances::default())),
            CancellationToken::new(),
        );
        (router(state), execution)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    /// Connect the local signer and return the session body and its token.
    async fn connect_local(app: &Router) -> (Value, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/v1/sessions",
            None,
            Some(json!({ "provider": "local" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let token = body["access_token"].as_str().unwrap().to_string();
        (body, token)
    }

    fn permit() -> Value {
        json!({
            "domain": {
                "name": "USD Coin",
                "version": "2",
                "chainId": 84532,
                "verifyingContract": "0x036CbD53842c5426634e7929541eC2318f3dCF7e",
            },
            "types": {
                "Permit": [
                    { "name": "owner", "type": "address" },
                    { "name": "spender", "type": "address" },
                    { "name": "value", "type": "uint256" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "deadline", "type": "uint256" },
                ],
            },
            "primaryType": "Permit",
            "message": {
                "owner": ANVIL_ADDRESS,
                "spender": "0x000000000000000000000000000000000000dEaD",
                "value": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
                "nonce": "0",
                "deadline": "115792089237316195423570985008687907853269984665640564039457584007913129639935",
            },
        })
    }

    #[tokio::test]
    async fn health_is_served() {
        let (app, _) = app(true);
        let (status, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn reconnecting_with_the_access_token_returns_the_same_session() {
        let (app, _) = app(true);
        let (first, token) = connect_local(&app).await;
        assert_eq!(first["address"], ANVIL_ADDRESS);
        assert_eq!(first["provider"], "local");
        assert_eq!(first["chain_ids"], json!([84532]));

        let (status, second) = send(
            &app,
            Method::POST,
            "/v1/sessions",
            Some(&token),
            Some(json!({ "provider": "local" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["session_id"], first["session_id"]);
        assert_eq!(second["created"], false);
        assert!(second.get("access_token").is_none());
    }

    #[tokio::test]
    async fn reconnecting_without_the_access_token_is_a_conflict() {
        let (app, _) = app(true);
        let (first, _) = connect_local(&app).await;

        for token in [None, Some("not-the-token")] {
            let (status, body) = send(
                &app,
                Method::POST,
                "/v1/sessions",
                token,
                Some(json!({ "provider": "local" })),
            )
            .await;
            assert_eq!(status, StatusCode::CONFLICT);
            assert!(body.get("session_id").is_none());
            assert!(body.get("access_token").is_none());
            assert!(!body.to_string().contains(first["session_id"].as_str().unwrap()));
        }
    }

    #[tokio::test]
    async fn session_routes_require_the_access_token() {
        let (app, execution) = app(true);
        let (_, token) = connect_local(&app).await;
        let base = format!("/v1/sessions/{ANVIL_ADDRESS}");

        let requests = [
            (Method::GET, base.clone(), None),
            (Method::GET, format!("{base}/balance"), None),
            (
                Method::POST,
                format!("{base}/sign/message"),
                Some(json!({ "message": "hello" })),
            ),
            (Method::POST, format!("{base}/sign/typed-data"), Some(permit())),
            (
                Method::POST,
                format!("{base}/transfers/quote"),
                Some(json!({ "recipients": [BOB], "amount": "1" })),
            ),
            (Method::POST, format!("{base}/transfers/execute"), None),
            (Method::DELETE, base.clone(), None),
        ];

        for stranger in [None, Some("0123456789abcdef")] {
            for (method, uri, body) in requests.iter().cloned() {
                let (status, response) = send(&app, method.clone(), &uri, stranger, body).await;
                assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
                assert_eq!(response["code"], auth::UNAUTHORIZED_CODE);
                assert!(response.get("signature").is_none());
            }
        }
        assert!(execution.quotes.lock().unwrap().is_empty());
        assert!(execution.executed.lock().unwrap().is_empty());

        let (status, _) = send(&app, Method::GET, &base, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn a_token_only_opens_its_own_session() {
        let (app, _) = app(true);
        let (_, token) = connect_local(&app).await;

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/v1/sessions/{BOB}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unconfigured_provider_is_service_unavailable() {
        let (app, _) = app(true);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/sessions",
            None,
            Some(json!({ "provider": "app_wallet", "wallet_id": "w", "access_token": "t" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("APP_WALLET_APP_ID"));
    }

    #[tokio::test]
    async fn signed_message_recovers_to_session_address() {
        let (app, _) = app(true);
        let (_, token) = connect_local(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/sign/message"),
            Some(&token),
            Some(json!({ "message": "hello" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let raw: alloy::primitives::Bytes = serde_json::from_value(body["signature"].clone()).unwrap();
        let signature = Signature::try_from(raw.as_ref()).unwrap();
        assert_eq!(
            signature.recover_address_from_msg("hello").unwrap(),
            ANVIL_ADDRESS.parse::<Address>().unwrap()
        );
    }

    #[tokio::test]
    async fn typed_data_is_signed() {
        let (app, _) = app(true);
        let (_, token) = connect_local(&app).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/sign/typed-data"),
            Some(&token),
            Some(json!({
                "domain": { "name": "Demo", "version": "1", "chainId": 84532 },
                "types": { "Mail": [{ "name": "contents", "type": "string" }] },
                "primaryType": "Mail",
                "message": { "contents": "hello" },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["signature"].as_str().unwrap().starts_with("0x"));
    }

    #[tokio::test]
    async fn quote_then_execute_a_two_recipient_transfer() {
        let (app, execution) = app(true);
        let (_, token) = connect_local(&app).await;
        let token = Some(token.as_str());

        let (status, quote) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/transfers/quote"),
            token,
            Some(json!({ "recipients": [BOB, CAROL], "amount": "1.5" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["amount_raw"], "1500000");
        assert_eq!(quote["total_raw"], "3000000");
        assert_eq!(quote["total_formatted"], "3");
        {
            let quotes = execution.quotes.lock().unwrap();
            assert_eq!(quotes.len(), 1);
            assert_eq!(quotes[0].instructions.len(), 2);
        }

        let (_, session) = send(
            &app,
            Method::GET,
            &format!("/v1/sessions/{ANVIL_ADDRESS}"),
            token,
            None,
        )
        .await;
        assert_eq!(session["pending_quote"]["quote_hash"], quote["quote_hash"]);

        let (status, receipt) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/transfers/execute"),
            token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(receipt["status"], "success");
        assert_eq!(receipt["quote_hash"], quote["quote_hash"]);
        assert_eq!(execution.executed.lock().unwrap().len(), 1);

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/transfers/execute"),
            token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_recipients_are_bad_requests() {
        let (app, execution) = app(true);
        let (_, token) = connect_local(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/transfers/quote"),
            Some(&token),
            Some(json!({ "recipients": [BOB, " "], "amount": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(execution.quotes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn quote_without_execution_config_is_service_unavailable() {
        let (app, _) = app(false);
        let (_, token) = connect_local(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/transfers/quote"),
            Some(&token),
            Some(json!({ "recipients": [BOB], "amount": "1" })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn disconnect_removes_the_session() {
        let (app, _) = app(true);
        let (_, token) = connect_local(&app).await;

        let uri = format!("/v1/sessions/{ANVIL_ADDRESS}");
        let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            Method::GET,
            "/v1/sessions/not-an-address",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, fresh) = connect_local(&app).await;
        assert_ne!(fresh, token);
        let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn balance_snapshot_is_served() {
        let (app, _) = app(true);
        let (_, token) = connect_local(&app).await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/v1/sessions/{ANVIL_ADDRESS}/balance"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["address"], ANVIL_ADDRESS);
        assert_eq!(body["native"]["symbol"], "ETH");
        assert!(body["last_error"].is_null());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (app, _) = app(true);
        let (status, body) = send(&app, Method::GET, "/api-doc/openapi.json", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/v1/sessions"].is_object());
        assert_eq!(
            body["components"]["securitySchemes"]["bearer_auth"]["scheme"],
            "bearer"
        );
    }
}
