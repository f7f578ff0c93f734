use issuer::{
    blob_storage, server,
    types::{AppConfig, Environment},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env file for local development
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON for staging/production log ingestion, regular format for development
    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env(environment).inspect_err(|e| {
        tracing::error!("Refusing to start: {e}");
    })?;
    tracing::info!(environment = ?config.environment, storage = ?config.storage, "Loaded configuration");

    let store = blob_storage::connect(&config.storage).await?;

    server::start(config, store).await.inspect_err(|e| {
        tracing::error!("Issuer stopped: {e:#}");
    })
}
