mod config;
mod db;
mod models;
mod processor;
mod server;

use config::AppConfig;
use db::PgAlertStore;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load config
    let config = AppConfig::load()?;

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .init();

    info!("Starting Alerts Function...");

    // Init DB
    let pool = db::init_pool(&config.database);
    info!(
        "Database pool ready for {}:{}/{}",
        config.database.server, config.database.port, config.database.database
    );
    if config.init_schema {
        db::init_schema(&pool).await?;
    }

    // Serve the HTTP trigger
    server::run_server(&config, PgAlertStore::new(pool)).await?;

    Ok(())
}
