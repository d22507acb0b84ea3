//! # Core Traits (Ports)
//!
//! The seams between the client core and its collaborators: the wire,
//! credential storage, and navigation. Adapters implement these; the
//! services crate only ever talks through them.

use async_trait::async_trait;
#[cfg(any(test, feature = "testing"))]
use mockall::automock;
use secrecy::SecretString;

use crate::error::Result;
use crate::models::{FeedPage, SessionTokens};

/// HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// A single outbound call, described independently of any HTTP library.
/// Immutable once built; retries re-issue the same value rather than
/// mutating it in place.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl OutboundRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// What came back over the wire, before any interpretation.
#[derive(Debug, Clone)]
pub struct WireResponse {
    pub status: u16,
    pub body: String,
}

impl WireResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The raw wire. Implementations perform exactly one HTTP exchange and
/// report transport failures (DNS, timeout, connection reset) as errors;
/// any response with a status code, however unhappy, is `Ok`.
///
/// `bearer` is attached as `Authorization: Bearer <token>` when present
/// and the header is omitted entirely when `None`, never sent empty.
///
/// Not mocked: tests stub the wire with small scripted transports, which
/// read better than predicate matching over request values.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: &OutboundRequest,
        bearer: Option<&str>,
    ) -> anyhow::Result<WireResponse>;
}

/// Credential persistence contract. Where and how the pair is stored is
/// the adapter's concern.
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait TokenStore: Send + Sync {
    fn access_token(&self) -> Option<SecretString>;
    fn refresh_token(&self) -> Option<SecretString>;
    /// Persists a freshly rotated pair, replacing both halves atomically.
    fn set_tokens(&self, tokens: SessionTokens);
    fn clear(&self);
}

/// Navigation contract for forced logout.
///
/// Must be idempotent: invoking it while already on the login view is a
/// no-op (implementations check their current route).
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Paged feed access as the controller sees it: one page in, already
/// normalized. Implementations never leak status codes; failures arrive
/// as `AppError` with a displayable message.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_page(&self, page: u32, limit: u32) -> Result<FeedPage>;
}
