use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, EnvFilter};
use veritas_core::{create_provider, ProviderConfig, VerdictProvider, VeritasConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "veritas.toml")]
    config: String,

    /// Print the resolved provider setup and exit
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config
    let config = match VeritasConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Init logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.service.log_level));
    fmt().with_env_filter(filter).init();

    let provider = build_provider(&config);

    if args.health {
        match &provider {
            Some(p) => println!("✅ Upstream provider: {} ({})", p.name(), p.model()),
            None => {
                println!("❌ Upstream provider unavailable, using the fallback classifier");
                std::process::exit(1);
            }
        }
        println!("✅ Veritas health check passed");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    veritas_server::http::start_http_server(config, provider, tx.subscribe()).await?;

    Ok(())
}

/// Build the upstream provider. A missing key or unknown provider is not
/// fatal: the service still answers every claim through the fallback
/// classifier.
fn build_provider(config: &VeritasConfig) -> Option<Arc<dyn VerdictProvider>> {
    match ProviderConfig::from_upstream(&config.upstream).and_then(create_provider) {
        Ok(provider) => {
            tracing::info!(
                provider = provider.name(),
                model = provider.model(),
                timeout_seconds = config.upstream.timeout_seconds,
                "Upstream provider ready"
            );
            Some(Arc::from(provider))
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Upstream provider unavailable, all claims will use the fallback classifier"
            );
            None
        }
    }
}
