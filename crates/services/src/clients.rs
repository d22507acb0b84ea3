//! Typed API clients layered over the gateway.
//!
//! Thin pass-through flows: each method builds one request, sends it
//! through the gateway, and unwraps the response envelope. All the
//! interesting failure handling already happened below.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::info;

use domains::{
    ApiEnvelope, AppError, FeedPage, FeedSource, LoginCredentials, OutboundRequest, Result,
    SessionData, TokenStore,
};

use crate::gateway::RequestGateway;

/// Paged feed access backed by `GET /feed/`.
pub struct FeedClient {
    gateway: Arc<RequestGateway>,
}

impl FeedClient {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<FeedPage> {
        let request = OutboundRequest::get("/feed/")
            .with_query("page", page)
            .with_query("limit", limit);
        let envelope: ApiEnvelope<FeedPage> = self.gateway.send(request).await?;
        Ok(envelope.data)
    }
}

/// Login/logout pass-through flows plus the session lifecycle hooks the
/// gateway depends on (token persistence and refresh-flag reset).
pub struct SessionService {
    gateway: Arc<RequestGateway>,
    tokens: Arc<dyn TokenStore>,
}

impl SessionService {
    pub fn new(gateway: Arc<RequestGateway>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { gateway, tokens }
    }

    /// Authenticates and arms the fresh session: persists the issued token
    /// pair and resets the refresh-coordination flags exactly once.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<SessionData> {
        if credentials.email.trim().is_empty()
            || credentials.password.expose_secret().is_empty()
        {
            return Err(AppError::Validation("email and password are required".into()));
        }

        let request = OutboundRequest::post("/auth/login").with_json(serde_json::json!({
            "email": credentials.email,
            "password": credentials.password.expose_secret(),
        }));
        let envelope: ApiEnvelope<SessionData> = self.gateway.send(request).await?;

        self.tokens.set_tokens(envelope.data.tokens.clone());
        self.gateway.reset_session();
        info!(email = %credentials.email, "logged in");
        Ok(envelope.data)
    }

    /// Ends the session server-side, then clears local credentials even if
    /// the server call failed; a dead session must not leave live tokens.
    pub async fn logout(&self) -> Result<()> {
        let request = OutboundRequest::post("/auth/logout");
        let outcome: Result<ApiEnvelope<serde_json::Value>> = self.gateway.send(request).await;

        self.tokens.clear();
        self.gateway.reset_session();
        info!("logged out");
        outcome.map(|_| ())
    }
}
