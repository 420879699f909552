//! GitHub OAuth authentication
//!
//! Handles:
//! - GitHub OAuth flow
//! - GitHub code exchange and profile lookup
//! - Issued access/refresh tokens

pub mod github;
mod oauth;
pub mod token;

pub use github::{GitHubClient, GitHubUser};
pub use oauth::auth_router;
pub use token::{TokenClaims, TokenIssuer, TokenPair, TokenScope};
