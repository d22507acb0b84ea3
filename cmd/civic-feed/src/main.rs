//! # civic-feed binary
//!
//! Headless smoke client: wires the adapters into the gateway and feed
//! controller, optionally logs in or resumes a saved session, fetches the
//! first feed page, and prints it.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use configs::Settings;
use domains::LoginCredentials;
use http_adapters::{MemoryTokenStore, ReqwestTransport, RouteNavigator};
use services::{FeedClient, FeedController, RequestGateway, SessionService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::load()?;

    // 1. Adapters behind the ports
    let transport = Arc::new(ReqwestTransport::new(
        &settings.api_base_url,
        Duration::from_secs(settings.request_timeout_secs),
    )?);
    let tokens = Arc::new(match settings.refresh_token.clone() {
        Some(refresh) => MemoryTokenStore::with_refresh_token(refresh),
        None => MemoryTokenStore::new(),
    });
    let navigator = Arc::new(RouteNavigator::new());

    // 2. The gateway and the clients built on it
    let gateway = Arc::new(RequestGateway::new(transport, tokens.clone(), navigator));
    let session = SessionService::new(gateway.clone(), tokens.clone());

    if let (Some(email), Some(password)) =
        (settings.login_email.clone(), settings.login_password.clone())
    {
        session
            .login(&LoginCredentials { email, password })
            .await?;
    }

    // 3. Feed controller over the gateway-backed source
    let source = Arc::new(FeedClient::new(gateway));
    let controller = FeedController::new(source, settings.page_limit);

    controller.ensure_initial_load().await;
    let state = controller.snapshot();

    if let Some(error) = &state.error {
        tracing::warn!(error = %error, "feed load failed");
    }
    for post in &state.posts {
        println!(
            "[{:?}] {}: {}",
            post.post_category, post.user.full_name, post.post_content
        );
    }
    tracing::info!(
        posts = state.posts.len(),
        has_next = state
            .pagination
            .as_ref()
            .map(|p| p.has_next_page)
            .unwrap_or(false),
        "feed fetched"
    );

    Ok(())
}
