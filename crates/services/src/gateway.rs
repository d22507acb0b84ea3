//! # RequestGateway
//!
//! The single chokepoint for outbound HTTP calls. Attaches the current
//! access token, coordinates the de-duplicated refresh-and-retry protocol
//! on 401, and normalizes every failure into `AppError` so nothing above
//! this layer ever inspects a status code.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use domains::{
    ApiEnvelope, AppError, HttpTransport, Navigator, OutboundRequest, Result, SessionData,
    TokenStore, WireResponse,
};

use crate::refresh::{RefreshCoordinator, RefreshPhase, RefreshTicket};

/// The one endpoint that must never itself be refreshed.
pub const REFRESH_ENDPOINT: &str = "/auth/refresh-token";

const GENERIC_ERROR: &str = "An error occurred";

/// One outbound call plus its retry bookkeeping. Immutable: the retry
/// path builds a new value instead of mutating a shared config.
#[derive(Debug, Clone)]
struct RequestAttempt {
    request: OutboundRequest,
    retried: bool,
}

impl RequestAttempt {
    fn first(request: OutboundRequest) -> Self {
        Self {
            request,
            retried: false,
        }
    }

    /// Consumes the attempt and produces its one allowed retry.
    fn into_retry(self) -> Self {
        Self {
            request: self.request,
            retried: true,
        }
    }
}

pub struct RequestGateway {
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<dyn TokenStore>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<dyn TokenStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            tokens,
            navigator,
            refresh: RefreshCoordinator::new(),
        }
    }

    /// Issues a request and deserializes the 2xx body into `T`.
    ///
    /// Failure protocol, in order:
    /// 1. the refresh endpoint answering 400/401 is terminal; never
    ///    refresh a refresh;
    /// 2. a first-time 401 enters the coordinated refresh path and the
    ///    original request is re-issued at most once;
    /// 3. everything else is normalized into `AppError::Request` with the
    ///    best message available.
    pub async fn send<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T> {
        let mut attempt = RequestAttempt::first(request);
        loop {
            let response = self.issue(&attempt.request).await?;
            if response.is_success() {
                return decode(&response);
            }

            if attempt.request.path == REFRESH_ENDPOINT
                && matches!(response.status, 400 | 401)
            {
                warn!(status = response.status, "refresh endpoint rejected the session");
                self.tokens.clear();
                self.force_logout();
                return Err(AppError::AuthExpired(extract_message(&response)));
            }

            if response.status == 401 && !attempt.retried {
                match self.refresh.acquire() {
                    RefreshTicket::Lead => {
                        warn!(path = %attempt.request.path, "access token rejected; attempting refresh");
                        let renewed = self.run_refresh().await;
                        self.refresh.settle(renewed);
                        if renewed {
                            attempt = attempt.into_retry();
                            continue;
                        }
                        // Unrecoverable refresh failure ends the session.
                        self.tokens.clear();
                        self.force_logout();
                        return Err(AppError::AuthExpired("token refresh failed".into()));
                    }
                    RefreshTicket::Follow(mut receiver) => {
                        debug!(path = %attempt.request.path, "awaiting in-flight token refresh");
                        let renewed = receiver
                            .wait_for(|phase| matches!(phase, RefreshPhase::Settled { .. }))
                            .await
                            .map(|phase| matches!(*phase, RefreshPhase::Settled { renewed: true }))
                            .unwrap_or(false);
                        if renewed {
                            attempt = attempt.into_retry();
                            continue;
                        }
                        return Err(AppError::AuthExpired("token refresh failed".into()));
                    }
                    RefreshTicket::Denied => {
                        warn!(path = %attempt.request.path, "session already spent its refresh attempt");
                        self.force_logout();
                        return Err(AppError::AuthExpired(
                            "session expired after refresh attempt".into(),
                        ));
                    }
                }
            }

            return Err(AppError::Request(extract_message(&response)));
        }
    }

    /// Clears the refresh-coordination flags. Must be called exactly once
    /// per successful login/registration so the fresh session is allowed
    /// its own refresh attempt.
    pub fn reset_session(&self) {
        debug!("session flags reset");
        self.refresh.reset();
    }

    /// One wire exchange with the bearer header attached when a token is
    /// present and omitted entirely when not, never a stale/empty header.
    async fn issue(&self, request: &OutboundRequest) -> Result<WireResponse> {
        let access = self.tokens.access_token();
        let bearer = access.as_ref().map(|token| token.expose_secret());
        debug!(method = request.method.as_str(), path = %request.path, "issuing request");
        self.transport
            .execute(request, bearer)
            .await
            .map_err(|err| AppError::Request(normalize_transport(&err)))
    }

    /// Posts the refresh token and persists the rotated pair. Runs on the
    /// bare transport: the retry protocol must not re-enter itself here.
    async fn run_refresh(&self) -> bool {
        let Some(refresh_token) = self.tokens.refresh_token() else {
            warn!("no refresh token found");
            return false;
        };
        let request = OutboundRequest::post(REFRESH_ENDPOINT).with_json(serde_json::json!({
            "refreshToken": refresh_token.expose_secret(),
        }));

        let access = self.tokens.access_token();
        let bearer = access.as_ref().map(|token| token.expose_secret());
        let response = match self.transport.execute(&request, bearer).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "token refresh transport failure");
                return false;
            }
        };
        if !response.is_success() {
            warn!(status = response.status, "token refresh rejected");
            return false;
        }
        match serde_json::from_str::<ApiEnvelope<SessionData>>(&response.body) {
            Ok(envelope) => {
                self.tokens.set_tokens(envelope.data.tokens);
                debug!("tokens rotated");
                true
            }
            Err(err) => {
                warn!(error = %err, "token refresh returned malformed body");
                false
            }
        }
    }

    fn force_logout(&self) {
        // Idempotent: the navigator no-ops when already on the login view.
        self.navigator.redirect_to_login();
    }
}

fn decode<T: DeserializeOwned>(response: &WireResponse) -> Result<T> {
    serde_json::from_str(&response.body)
        .map_err(|err| AppError::Request(format!("malformed response body: {err}")))
}

/// Best human-readable message: response-body `message` field, else the
/// generic fallback.
fn extract_message(response: &WireResponse) -> String {
    serde_json::from_str::<serde_json::Value>(&response.body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}

fn normalize_transport(err: &anyhow::Error) -> String {
    let message = err.to_string();
    if message.is_empty() {
        GENERIC_ERROR.to_string()
    } else {
        message
    }
}
