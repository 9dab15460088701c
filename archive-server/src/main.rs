use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, Level};

use archive_server::config::Config;
use archive_server::repository::SqliteRepository;
use archive_server::{app_router, AppState, ProjectStore, TokenVerifier};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Starting project archive server");

    let config = Config::from_env().context("Failed to load configuration from environment")?;

    let db_path = config.state_dir.join("archive-state.db");
    info!("Using project database: {}", db_path.display());
    let repository =
        SqliteRepository::new(&db_path).context("Failed to initialize SQLite database")?;

    let state = Arc::new(AppState {
        store: ProjectStore::new(Arc::new(repository)),
        token_verifier: TokenVerifier::new(&config.auth_secret),
        status_auth_token: config.status_auth_token,
    });

    let app = app_router(state);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
