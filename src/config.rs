//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)
//!
//! The GitHub OAuth app settings and the signing secret are read from the
//! flat variables `CLIENT_ID`, `CLIENT_SECRET`, `GITHUB_LOGIN_URL`,
//! `ACCESS_TOKEN_URL`, `REDIRECT_URI` and `SECRET`. Everything else uses
//! `GITGAME__SECTION__KEY`.

use serde::Deserialize;

use crate::error::AppError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8000)
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// GitHub OAuth app configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Authorization page users are redirected to
    pub login_url: String,
    /// Code exchange endpoint
    pub access_token_url: String,
    /// Callback registered with the OAuth app
    pub redirect_uri: String,
    /// Authenticated user endpoint
    pub user_url: String,
    /// Upper bound for each outbound GitHub request
    pub timeout_seconds: u64,
}

/// Issued token configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC-SHA256 signing key (32+ bytes)
    pub secret: String,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub fn filter_directive(&self) -> String {
        format!("gitgame_auth={},tower_http=debug", self.level.to_ascii_lowercase())
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    fn validate(&self) -> Result<(), AppError> {
        self.level.parse::<tracing::Level>().map_err(|_| {
            AppError::Config(format!("logging.level {:?} is not a log level", self.level))
        })?;

        if !self.is_json() && !self.format.eq_ignore_ascii_case("pretty") {
            return Err(AppError::Config(format!(
                "logging.format must be \"pretty\" or \"json\", got {:?}",
                self.format
            )));
        }

        Ok(())
    }
}

/// Flat environment variables and the keys they populate.
const FLAT_ENV_KEYS: [(&str, &str); 6] = [
    ("CLIENT_ID", "github.client_id"),
    ("CLIENT_SECRET", "github.client_secret"),
    ("GITHUB_LOGIN_URL", "github.login_url"),
    ("ACCESS_TOKEN_URL", "github.access_token_url"),
    ("REDIRECT_URI", "github.redirect_uri"),
    ("SECRET", "auth.secret"),
];

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (GITGAME__*)
    /// 5. Flat environment variables (CLIENT_ID, SECRET, ...)
    ///
    /// # Errors
    /// Returns error if a required value is missing or invalid
    pub fn load() -> Result<Self, AppError> {
        use config::{Config, Environment, File};

        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("github.login_url", "https://github.com/login/oauth/authorize")?
            .set_default(
                "github.access_token_url",
                "https://github.com/login/oauth/access_token",
            )?
            .set_default("github.user_url", "https://api.github.com/user")?
            .set_default("github.timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("GITGAME")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in FLAT_ENV_KEYS {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let app_config: Self = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    fn validate(&self) -> Result<(), AppError> {
        const MIN_SECRET_BYTES: usize = 32;

        let required = [
            ("CLIENT_ID", &self.github.client_id),
            ("CLIENT_SECRET", &self.github.client_secret),
            ("REDIRECT_URI", &self.github.redirect_uri),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::Config(format!("{name} must not be empty")));
            }
        }

        let urls = [
            ("GITHUB_LOGIN_URL", &self.github.login_url),
            ("ACCESS_TOKEN_URL", &self.github.access_token_url),
            ("REDIRECT_URI", &self.github.redirect_uri),
            ("github.user_url", &self.github.user_url),
        ];
        for (name, value) in urls {
            url::Url::parse(value)
                .map_err(|e| AppError::Config(format!("{name} is not a valid URL: {e}")))?;
        }

        if self.auth.secret.as_bytes().len() < MIN_SECRET_BYTES {
            return Err(AppError::Config(format!(
                "SECRET must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if self.github.timeout_seconds == 0 {
            return Err(AppError::Config(
                "github.timeout_seconds must be greater than 0".to_string(),
            ));
        }

        self.logging.validate()
    }
}
