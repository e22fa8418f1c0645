mod server;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pixgate_api::{DiscoveryClient, TransportConfig};
use pixgate_core::{DeviceRegistry, Gateway};

/// REST gateway for Wi-Fi pixel-display devices.
#[derive(Debug, Parser)]
#[command(name = "pixgate", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "PIXGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address override (e.g. 127.0.0.1:8080).
    #[arg(long)]
    listen: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = pixgate_config::load(cli.config.as_deref())?;
    let listen = cli.listen.unwrap_or_else(|| config.listen.clone());

    let transport = TransportConfig {
        timeout: std::time::Duration::from_secs(config.timeout_secs),
        retry_backoff: std::time::Duration::from_millis(config.retry_backoff_ms),
    };

    let entries = config.device_entries()?;
    let discovery = DiscoveryClient::new(&transport)?;
    let registry = DeviceRegistry::register(&entries, &discovery, &transport).await?;

    for profile in registry.profiles() {
        tracing::info!(
            name = %profile.name,
            ip = %profile.ip,
            family = %profile.family,
            resolution = profile.resolution,
            "registered device"
        );
    }

    let gateway = Gateway::new(registry);
    server::serve(gateway, &listen).await?;
    Ok(())
}
