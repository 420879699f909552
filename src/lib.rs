//! gitgame-auth - Login with GitHub for GitGame
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /github/login, /github/authenticate                      │
//! │  - /health, /metrics                                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Auth Layer                             │
//! │  - GitHub code exchange and profile lookup                  │
//! │  - HS256 access/refresh token issuance                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers outside the login flow
//! - `auth`: GitHub OAuth flow and token issuance
//! - `config`: Configuration management
//! - `error`: Error types
//! - `metrics`: Prometheus instruments

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

use std::sync::Arc;

/// Application state shared across all handlers
///
/// Everything in here is read-only after startup, so concurrent
/// requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// GitHub OAuth client (pooled HTTP connections)
    pub github: Arc<auth::GitHubClient>,

    /// Signs issued tokens
    pub tokens: Arc<auth::TokenIssuer>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Errors
    /// Returns error if the outbound HTTP client cannot be built
    pub fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let github = auth::GitHubClient::new(config.github.clone())?;
        let tokens = auth::TokenIssuer::new(config.auth.secret.as_bytes());

        tracing::info!(
            timeout_seconds = config.github.timeout_seconds,
            "Application state initialized successfully"
        );

        Ok(Self {
            config: Arc::new(config),
            github: Arc::new(github),
            tokens: Arc::new(tokens),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/github", auth::auth_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
