use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edu_crm_api::config;
use edu_crm_api::database::DatabaseManager;
use edu_crm_api::{router, AppState};

#[derive(Debug, Parser)]
#[command(name = "edu-crm-api", version, about = "Education CRM entity store and JSON API")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_PATH, JWT_SECRET etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(path) = args.database {
        config.database.path = path;
    }
    config.validate()?;
    tracing::info!("Starting Education CRM API in {:?} mode", config.environment);

    let pool = DatabaseManager::connection(&config.database)
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let app = router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
