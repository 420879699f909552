//! Issued token management
//!
//! Tokens are HS256 JSON Web Tokens signed with a single static secret.
//! No server-side token storage needed.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::metrics::TOKENS_ISSUED_TOTAL;

/// Lifetime of an access token (15 minutes)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
/// Lifetime of a refresh token (72 hours)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 72 * 60 * 60;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    Access,
    Refresh,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Access => "access",
            TokenScope::Refresh => "refresh",
        }
    }

    pub fn ttl(self) -> Duration {
        match self {
            TokenScope::Access => Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            TokenScope::Refresh => Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// GitHub login the token was issued for
    pub login: String,
    pub scope: TokenScope,
    /// Expiry as unix seconds
    pub exp: i64,
}

/// Access and refresh token minted from the same login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signs access and refresh tokens
///
/// Holds the keys derived from the secret loaded at startup; cheap to
/// clone into handlers.
#[derive(Clone)]
pub struct TokenIssuer {
    has_secret: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer").finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            has_secret: !secret.is_empty(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issue a 15 minute access token for `login`
    pub fn issue_access_token(&self, login: &str) -> Result<String, AppError> {
        self.issue(login, TokenScope::Access, Utc::now())
    }

    /// Issue a 72 hour refresh token for `login`
    pub fn issue_refresh_token(&self, login: &str) -> Result<String, AppError> {
        self.issue(login, TokenScope::Refresh, Utc::now())
    }

    /// Issue both tokens from the same instant
    pub fn issue_pair(&self, login: &str) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.issue(login, TokenScope::Access, now)?,
            refresh_token: self.issue(login, TokenScope::Refresh, now)?,
        })
    }

    /// Sign an HS256 token for `login` as if issued at `issued_at`
    pub fn issue(
        &self,
        login: &str,
        scope: TokenScope,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        // HMAC accepts an empty key, which would make every token forgeable
        if !self.has_secret {
            return Err(AppError::Signing("signing secret is empty".to_string()));
        }

        let claims = TokenClaims {
            login: login.to_string(),
            scope,
            exp: (issued_at + scope.ttl()).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Signing(format!("token encoding failed: {e}")))?;
        TOKENS_ISSUED_TOTAL.with_label_values(&[scope.as_str()]).inc();

        Ok(token)
    }

    /// Verify and decode an issued token
    ///
    /// # Errors
    /// Returns `Validation` if the token is malformed, tampered with,
    /// signed with another key or algorithm, or expired.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, AppError> {
        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Validation("invalid token: expired".to_string())
                }
                _ => AppError::Validation(format!("invalid token: {e}")),
            })?;

        Ok(token_data.claims)
    }
}
