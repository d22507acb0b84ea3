//! Session lifecycle: login persisting tokens and re-arming the refresh
//! guard, input validation, and logout clearing credentials.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use domains::{
    ApiEnvelope, AppError, FeedPage, HttpTransport, LoginCredentials, OutboundRequest,
    SessionTokens, TokenStore, WireResponse,
};
use http_adapters::{MemoryTokenStore, Route, RouteNavigator};
use integration_tests::fixtures;
use secrecy::{ExposeSecret, SecretString};
use services::gateway::REFRESH_ENDPOINT;
use services::{RequestGateway, SessionService};

/// A small scripted backend: login issues a stale pair, the refresh
/// endpoint rotates to the fresh pair, the feed only answers to the
/// fresh token, and logout always fails server-side.
struct ScriptedBackend {
    calls: AtomicUsize,
    refresh_calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpTransport for ScriptedBackend {
    async fn execute(
        &self,
        request: &OutboundRequest,
        bearer: Option<&str>,
    ) -> anyhow::Result<WireResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(match request.path.as_str() {
            "/auth/login" => WireResponse {
                status: 200,
                body: fixtures::tokens_body("acc", "ref"),
            },
            "/auth/logout" => WireResponse {
                status: 500,
                body: r#"{"status":"error","message":"logout failed"}"#.to_string(),
            },
            path if path == REFRESH_ENDPOINT => {
                self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                WireResponse {
                    status: 200,
                    body: fixtures::tokens_body("fresh", "ref-2"),
                }
            }
            _ => {
                if bearer == Some("fresh") {
                    let page = fixtures::page(vec![fixtures::post(1)], 1, 1);
                    WireResponse {
                        status: 200,
                        body: fixtures::feed_body(&page),
                    }
                } else {
                    WireResponse {
                        status: 401,
                        body: r#"{"status":"error","message":"jwt expired"}"#.to_string(),
                    }
                }
            }
        })
    }
}

fn credentials() -> LoginCredentials {
    LoginCredentials {
        email: "clerk@example.gov".to_string(),
        password: SecretString::from("hunter2"),
    }
}

#[tokio::test]
async fn login_rearms_the_refresh_guard_for_the_new_session() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(MemoryTokenStore::new());
    let navigator = Arc::new(RouteNavigator::new());
    let gateway = Arc::new(RequestGateway::new(
        backend.clone(),
        store.clone(),
        navigator.clone(),
    ));
    let session = SessionService::new(gateway.clone(), store.clone());

    // Anonymous fetch: 401 with no refresh token to fall back on; the
    // session's one refresh attempt is spent without a refresh call.
    let err = gateway
        .send::<ApiEnvelope<FeedPage>>(OutboundRequest::get("/feed/"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AuthExpired(_)));
    assert_eq!(navigator.current_route(), Route::Login);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 0);

    // Login persists the issued pair and resets the refresh flags.
    session.login(&credentials()).await.unwrap();
    assert_eq!(store.access_token().unwrap().expose_secret(), "acc");

    // The new session is allowed its own refresh attempt: the stale
    // access token 401s, one refresh rotates it, the retry succeeds.
    let envelope = gateway
        .send::<ApiEnvelope<FeedPage>>(OutboundRequest::get("/feed/"))
        .await
        .unwrap();
    assert_eq!(envelope.data.posts.len(), 1);
    assert_eq!(backend.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.access_token().unwrap().expose_secret(), "fresh");
}

#[tokio::test]
async fn login_rejects_blank_credentials_before_any_request() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(MemoryTokenStore::new());
    let gateway = Arc::new(RequestGateway::new(
        backend.clone(),
        store.clone(),
        Arc::new(RouteNavigator::new()),
    ));
    let session = SessionService::new(gateway, store);

    let err = session
        .login(&LoginCredentials {
            email: "  ".to_string(),
            password: SecretString::from("hunter2"),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn logout_clears_tokens_even_when_the_server_call_fails() {
    let backend = Arc::new(ScriptedBackend::new());
    let store = Arc::new(MemoryTokenStore::new());
    store.set_tokens(SessionTokens {
        access_token: SecretString::from("acc"),
        refresh_token: SecretString::from("ref"),
    });
    let gateway = Arc::new(RequestGateway::new(
        backend,
        store.clone(),
        Arc::new(RouteNavigator::new()),
    ));
    let session = SessionService::new(gateway, store.clone());

    let err = session.logout().await.unwrap_err();
    assert_eq!(err.to_string(), "logout failed");
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}
