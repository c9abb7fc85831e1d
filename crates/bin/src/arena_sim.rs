//! Arena Sim - headless collision simulation binary.
//!
//! Usage: `arena-sim [CONFIG_PATH]` (defaults to `config.toml`).

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Arena Sim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = sim::Config::load(&path)?;
    info!("Loaded configuration from {}", path);
    info!("  Arena: {}", config.arena.boundary());
    info!(
        "  Quadtree: capacity {}, max depth {}",
        config.quadtree.capacity, config.quadtree.max_depth
    );
    info!("  Spawn: {} bodies ({:?})", config.spawn.count, config.spawn.layout);
    if config.hazard.interval > 0 {
        info!(
            "  Hazard: radius {} at {} every {} frames",
            config.hazard.radius,
            config.hazard.center(),
            config.hazard.interval
        );
    }

    sim::run(config).await?;

    Ok(())
}
