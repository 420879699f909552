//! GitHub OAuth flow
//!
//! Implements the OAuth 2.0 authorization code flow with GitHub and hands
//! back this service's own token pair.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect},
    routing::get,
};
use serde::Deserialize;

use super::token::TokenPair;
use crate::AppState;
use crate::error::AppError;

/// Create authentication router
///
/// Routes:
/// - GET /login - Redirect to GitHub
/// - GET /authenticate - OAuth callback, returns the token pair
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", get(github_login))
        .route("/authenticate", get(github_authenticate))
}

// =============================================================================
// GitHub OAuth
// =============================================================================

/// GET /github/login
///
/// Permanently redirects the user to the GitHub authorization page.
async fn github_login(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let url = state.github.authorization_url()?;
    Ok(Redirect::permanent(&url))
}

/// Query parameters from GitHub callback
#[derive(Debug, Deserialize)]
struct GitHubCallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// Set instead of `code` when the user declined
    error: Option<String>,
    error_description: Option<String>,
}

/// GET /github/authenticate
///
/// Handles OAuth callback from GitHub.
///
/// # Steps
/// 1. Exchange code for access token
/// 2. Fetch user info from GitHub
/// 3. Issue access and refresh tokens for the GitHub login
async fn github_authenticate(
    State(state): State<AppState>,
    Query(query): Query<GitHubCallbackQuery>,
) -> Result<Json<TokenPair>, AppError> {
    if let Some(error) = query.error {
        // The description is caller-controlled text; it stays out of the response
        tracing::warn!(
            error = %error,
            description = ?query.error_description,
            "GitHub redirected back without a code"
        );
        return Err(AppError::AuthorizationDenied(error));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("Missing authorization code".to_string()))?;

    let github_token = state.github.exchange_code(&code).await?;
    tracing::debug!("GitHub code exchanged");

    let user = state.github.fetch_profile(&github_token).await?;
    tracing::debug!(login = %user.login, github_id = ?user.id, "GitHub profile fetched");

    let tokens = state.tokens.issue_pair(&user.login)?;
    tracing::info!(login = %user.login, "Issued token pair");

    Ok(Json(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::valid_config;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let state = AppState::new(valid_config()).unwrap();
        Router::new().nest("/github", auth_router()).with_state(state)
    }

    async fn send_get(uri: &str) -> axum::response::Response {
        app()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn login_redirects_permanently_to_github() {
        let response = send_get("/github/login").await;

        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        let location = response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(location.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(location.contains("client_id=github-client-id"));
    }

    #[tokio::test]
    async fn authenticate_without_code_is_bad_request() {
        let response = send_get("/github/authenticate").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn authenticate_with_denied_consent_is_bad_request() {
        let response = send_get("/github/authenticate?error=access_denied").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&body).contains("access_denied"));
    }

    #[tokio::test]
    async fn denied_consent_body_omits_error_description() {
        let response = send_get(
            "/github/authenticate?error=access_denied&error_description=%3Cscript%3Ealert(1)%3C%2Fscript%3E",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8_lossy(&body);
        assert_eq!(body, "GitHub authorization was denied: access_denied");
        assert!(!body.contains("script"));
    }
}
