use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use users_api::config::{Config, LogFormat, TenantSource};
use users_api::db::users::UNIQUE_KEYS;
use users_api::store::{postgres, MemoryContainer, PgContainer, SharedContainer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Load config
    let config = Config::from_env().expect("Failed to load configuration");

    // Init tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!("Starting users-api");

    if let TenantSource::Static(tenant_id) = &config.tenant_source {
        tracing::warn!(
            tenant_id = %tenant_id,
            "JWT_SECRET not set, every request is served as a fixed development tenant"
        );
    }

    let users_container = open_users_container(&config).await?;

    let addr = SocketAddr::new(config.host, config.port);
    let app = users_api::build_app(users_container, config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn open_users_container(
    config: &Config,
) -> Result<SharedContainer, Box<dyn std::error::Error>> {
    let Some(database_url) = &config.database_url else {
        tracing::info!(
            container = %config.users_container,
            "DATABASE_URL not set, using in-memory document store"
        );
        let container =
            MemoryContainer::new(config.users_container.clone()).with_unique_keys(UNIQUE_KEYS);
        return Ok(Arc::new(container));
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.store_timeout)
        .connect(database_url)
        .await?;

    postgres::run_migrations(&pool).await?;
    tracing::info!("Migrations applied");

    let container = PgContainer::open(pool, &config.users_container, UNIQUE_KEYS).await?;
    tracing::info!(container = %config.users_container, "Document container opened");
    Ok(Arc::new(container))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
