//! gitgame-auth binary entry point

use gitgame_auth::{AppState, config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application entry point
///
/// # Setup
/// 1. Load `.env`
/// 2. Load configuration from file and environment
/// 3. Initialize tracing/logging from the `logging` section
/// 4. Initialize AppState
/// 5. Build Axum router
/// 6. Serve until Ctrl-C / SIGTERM
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the variables may come from the real environment
    dotenv::dotenv().ok();

    // 1. Load configuration; refuse to start when it is incomplete
    let config = match config::AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            init_tracing(&config::LoggingConfig::default());
            tracing::error!(%error, "Refusing to start");
            return Err(error.into());
        }
    };

    // 2. Initialize tracing/logging
    init_tracing(&config.logging);
    tracing::info!("Starting gitgame-auth...");
    tracing::info!(
        login_url = %config.github.login_url,
        redirect_uri = %config.github.redirect_uri,
        "Configuration loaded"
    );

    // 3. Initialize metrics
    gitgame_auth::metrics::init_metrics();

    // 4. Initialize application state
    let state = AppState::new(config.clone())?;

    // 5. Build Axum router
    let app = gitgame_auth::build_router(state);

    // 6. Start HTTP server
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
