//! GitHub identity exchange
//!
//! Builds the authorization URL, trades an authorization code for a GitHub
//! access token and fetches the profile that token belongs to.

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Deserialize;

use crate::config::GitHubConfig;
use crate::error::AppError;
use crate::metrics::{GITHUB_REQUEST_DURATION_SECONDS, GITHUB_REQUESTS_TOTAL};

const USER_AGENT: &str = concat!("gitgame-auth/", env!("CARGO_PKG_VERSION"));

/// GitHub token response
///
/// GitHub answers a bad code with 200 and an `error` body, so both
/// shapes decode into this record.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// GitHub user info
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: Option<u64>,
    pub name: Option<String>,
}

/// Client for the GitHub OAuth web flow
#[derive(Debug, Clone)]
pub struct GitHubClient {
    config: GitHubConfig,
    http: reqwest::Client,
}

impl GitHubClient {
    /// Build a client whose requests are bounded by `config.timeout_seconds`
    pub fn new(config: GitHubConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        Ok(Self { config, http })
    }

    /// URL of the GitHub consent page
    ///
    /// Carries `client_id` and `redirect_uri`. The client secret is only
    /// ever sent server-to-server during the code exchange.
    pub fn authorization_url(&self) -> Result<String, AppError> {
        let mut url = url::Url::parse(&self.config.login_url)
            .map_err(|e| AppError::Internal(e.into()))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_uri);

        Ok(url.into())
    }

    /// Exchange an authorization code for a GitHub access token
    ///
    /// # Errors
    /// `AppError::Exchange` on transport failure, a non-success status,
    /// an undecodable body, a GitHub `error` field or a missing token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let started = Instant::now();
        let result = self.request_access_token(code).await;
        record("exchange", started, result.is_ok());
        result
    }

    // The request URL carries the client secret, so errors are stripped of it
    async fn request_access_token(&self, code: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(&self.config.access_token_url)
            .query(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::Exchange(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Exchange(format!("GitHub returned {status}")));
        }

        let body: AccessTokenResponse = response
            .json()
            .await
            .map_err(|e| {
                AppError::Exchange(format!("invalid response body: {}", e.without_url()))
            })?;

        if let Some(error) = body.error {
            let description = body.error_description.unwrap_or_default();
            return Err(AppError::Exchange(format!("{error}: {description}")));
        }

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Exchange("response has no access_token".to_string()))
    }

    /// Fetch the profile of the user `token` was issued to
    ///
    /// # Errors
    /// `AppError::Profile` on transport failure, a non-success status or a
    /// body without a usable `login`.
    pub async fn fetch_profile(&self, token: &str) -> Result<GitHubUser, AppError> {
        let started = Instant::now();
        let result = self.request_profile(token).await;
        record("profile", started, result.is_ok());
        result
    }

    async fn request_profile(&self, token: &str) -> Result<GitHubUser, AppError> {
        let response = self
            .http
            .get(&self.config.user_url)
            .header(AUTHORIZATION, format!("token {token}"))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| AppError::Profile(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Profile(format!("GitHub returned {status}")));
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| AppError::Profile(format!("invalid response body: {e}")))?;

        if user.login.trim().is_empty() {
            return Err(AppError::Profile("profile has an empty login".to_string()));
        }

        Ok(user)
    }
}

fn record(step: &str, started: Instant, ok: bool) {
    let outcome = if ok { "success" } else { "failure" };
    GITHUB_REQUESTS_TOTAL
        .with_label_values(&[step, outcome])
        .inc();
    GITHUB_REQUEST_DURATION_SECONDS
        .with_label_values(&[step])
        .observe(started.elapsed().as_secs_f64());
}
