//! civic-feed/crates/http-adapters/src/lib.rs
//!
//! Concrete implementations of the client ports: a reqwest-backed wire,
//! an in-memory credential store, and a route-tracking navigator.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, warn};

use domains::{
    HttpTransport, Method, Navigator, OutboundRequest, SessionTokens, TokenStore, WireResponse,
};

/// `HttpTransport` over a shared reqwest client.
///
/// Exactly one exchange per call: any response with a status code is
/// `Ok`, only transport-level failures (DNS, timeout, reset) are errors.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &OutboundRequest,
        bearer: Option<&str>,
    ) -> anyhow::Result<WireResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &url).query(&request.query);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        // Omitted entirely when no token is present; never an empty header.
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(url = %url, status, "exchange complete");
        Ok(WireResponse { status, body })
    }
}

#[derive(Default)]
struct TokenPair {
    access: Option<SecretString>,
    refresh: Option<SecretString>,
}

/// In-memory `TokenStore`; the pair lives for the process lifetime.
#[derive(Default)]
pub struct MemoryTokenStore {
    pair: Mutex<TokenPair>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds only the refresh half, e.g. from a saved session. The first
    /// request will 401 without an access token and the gateway's refresh
    /// path rotates in a full pair.
    pub fn with_refresh_token(refresh: SecretString) -> Self {
        Self {
            pair: Mutex::new(TokenPair {
                access: None,
                refresh: Some(refresh),
            }),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn access_token(&self) -> Option<SecretString> {
        self.pair.lock().expect("token pair poisoned").access.clone()
    }

    fn refresh_token(&self) -> Option<SecretString> {
        self.pair.lock().expect("token pair poisoned").refresh.clone()
    }

    fn set_tokens(&self, tokens: SessionTokens) {
        let mut pair = self.pair.lock().expect("token pair poisoned");
        pair.access = Some(tokens.access_token);
        pair.refresh = Some(tokens.refresh_token);
    }

    fn clear(&self) {
        let mut pair = self.pair.lock().expect("token pair poisoned");
        pair.access = None;
        pair.refresh = None;
    }
}

/// Where the (headless) client currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Feed,
    Login,
}

/// `Navigator` that records the current route and makes the forced
/// redirect idempotent: already on the login view means no-op.
pub struct RouteNavigator {
    route: Mutex<Route>,
}

impl RouteNavigator {
    pub fn new() -> Self {
        Self {
            route: Mutex::new(Route::Feed),
        }
    }

    pub fn current_route(&self) -> Route {
        *self.route.lock().expect("route poisoned")
    }

    pub fn set_route(&self, route: Route) {
        *self.route.lock().expect("route poisoned") = route;
    }
}

impl Default for RouteNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for RouteNavigator {
    fn redirect_to_login(&self) {
        let mut route = self.route.lock().expect("route poisoned");
        if *route == Route::Login {
            return;
        }
        warn!("session expired; redirecting to login");
        *route = Route::Login;
    }
}
