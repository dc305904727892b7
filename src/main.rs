use std::net::SocketAddr;

use anyhow::Context;
use cattlefund::{config::{self, Config}, create_app, AppState};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before reading configuration
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(config::log_filter(config::SERVER_LOG_FILTER))
        .init();

    let config = Config::from_env()?;

    let mut options = ConnectOptions::new(config.database_url.clone());
    options.sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .context("failed to connect to database")?;

    if config.run_migrations {
        tracing::info!("applying pending migrations");
        Migrator::up(&db, None).await.context("migrations failed")?;
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::from_config(db, config)?;
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Server running on http://{}", bind_addr);

    // Connect info feeds the rate limiter's client IP fallback
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
