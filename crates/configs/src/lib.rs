//! civic-feed/crates/configs/src/lib.rs
//!
//! Typed settings for the client: defaults, an optional `civic-feed.toml`
//! next to the binary, and `CIVIC_FEED_*` environment overrides, in that
//! precedence order.

use config::builder::DefaultState;
use config::ConfigBuilder;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Base URL the transport prefixes onto every request path.
    pub api_base_url: String,
    /// Posts requested per feed page.
    pub page_limit: u32,
    /// Whole-request timeout; expiry surfaces as an ordinary transport error.
    pub request_timeout_secs: u64,
    /// Optional saved refresh token to resume a previous session with.
    pub refresh_token: Option<SecretString>,
    /// Optional credentials for a scripted login at startup.
    pub login_email: Option<String>,
    pub login_password: Option<SecretString>,
}

impl Settings {
    pub fn load() -> Result<Self, SettingsError> {
        // .env is best-effort; absence is not an error.
        dotenvy::dotenv().ok();

        let settings = defaults()?
            .add_source(config::File::with_name("civic-feed").required(false))
            .add_source(config::Environment::with_prefix("CIVIC_FEED"))
            .build()?
            .try_deserialize::<Settings>()?;

        debug!(api_base_url = %settings.api_base_url, page_limit = settings.page_limit, "settings loaded");
        Ok(settings)
    }
}

/// Base layer shared by `load` and the tests; file and env sources stack
/// on top.
fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("api_base_url", "http://localhost:3000/api/v1")?
        .set_default("page_limit", 10_i64)?
        .set_default("request_timeout_secs", 30_i64)
}
