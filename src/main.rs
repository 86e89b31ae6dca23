//! CLI entry point printing capacity estimates and rendering charts.

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = bikecap::config::CliArgs::parse();
    let config = bikecap::config::AppConfig::load(cli).await?;

    if let Err(error) = bikecap::run(config).await {
        tracing::error!(error = %error, "capacity run failed");
        return Err(error.into());
    }

    Ok(())
}
