//! Common test utilities for E2E tests

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use gitgame_auth::{AppState, config};
use serde_json::json;
use tokio::net::TcpListener;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const SECRET: &str = "test-secret-key-32-bytes-long!!!";
pub const GITHUB_TIMEOUT_SECS: u64 = 1;
/// How long the fake GitHub stalls on the `slow` code
pub const SLOW_RESPONSE: std::time::Duration = std::time::Duration::from_secs(3);

/// Test server instance backed by a fake GitHub
pub struct TestServer {
    pub addr: String,
    pub github_addr: String,
    pub state: AppState,
    pub client: reqwest::Client,
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server whose configuration is adjusted by `configure`
    pub async fn with_config(configure: impl FnOnce(&mut config::AppConfig)) -> Self {
        let github_addr = spawn(fake_github_router()).await;

        let mut config = config::AppConfig {
            server: config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            github: config::GitHubConfig {
                client_id: CLIENT_ID.to_string(),
                client_secret: CLIENT_SECRET.to_string(),
                login_url: format!("{github_addr}/login/oauth/authorize"),
                access_token_url: format!("{github_addr}/login/oauth/access_token"),
                redirect_uri: "http://localhost:3000/github/authenticate".to_string(),
                user_url: format!("{github_addr}/user"),
                timeout_seconds: GITHUB_TIMEOUT_SECS,
            },
            auth: config::AuthConfig {
                secret: SECRET.to_string(),
            },
            logging: config::LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        };
        configure(&mut config);

        let state = AppState::new(config).unwrap();
        let addr = spawn(gitgame_auth::build_router(state.clone())).await;

        // Redirects are asserted on, not followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        Self {
            addr,
            github_addr,
            state,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }
}

/// Serve `router` on an ephemeral port and return its base URL
async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

// =============================================================================
// Fake GitHub
// =============================================================================
//
// Codes:
// - abc123       -> ext-tok, profile {"login":"octocat"}
// - no-login     -> ghost-tok, profile without a login
// - revoked      -> revoked-tok, profile endpoint answers 401
// - no-token     -> 200 without access_token
// - server-error -> 500
// - slow         -> stalls for SLOW_RESPONSE, then ext-tok
// - anything else -> 200 {"error":"bad_verification_code"}

fn fake_github_router() -> Router {
    Router::new()
        .route("/login/oauth/access_token", get(fake_access_token))
        .route("/user", get(fake_user))
}

async fn fake_access_token(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let accepts_json = headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    let credentials_ok = params.get("client_id").map(String::as_str) == Some(CLIENT_ID)
        && params.get("client_secret").map(String::as_str) == Some(CLIENT_SECRET)
        && params.contains_key("redirect_uri");

    if !accepts_json || !credentials_ok {
        return (
            StatusCode::OK,
            Json(json!({ "error": "incorrect_client_credentials" })),
        )
            .into_response();
    }

    let token = match params.get("code").map(String::as_str) {
        Some("abc123") => "ext-tok",
        Some("no-login") => "ghost-tok",
        Some("revoked") => "revoked-tok",
        Some("no-token") => {
            return Json(json!({ "token_type": "bearer", "scope": "" })).into_response();
        }
        Some("server-error") => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some("slow") => {
            tokio::time::sleep(SLOW_RESPONSE).await;
            "ext-tok"
        }
        _ => {
            return Json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired.",
            }))
            .into_response();
        }
    };

    Json(json!({ "access_token": token, "token_type": "bearer", "scope": "" })).into_response()
}

async fn fake_user(headers: HeaderMap) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match authorization {
        "token ext-tok" => Json(json!({
            "login": "octocat",
            "id": 583231,
            "name": "The Octocat",
        }))
        .into_response(),
        "token ghost-tok" => Json(json!({ "id": 1, "name": null })).into_response(),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Bad credentials" })),
        )
            .into_response(),
    }
}
