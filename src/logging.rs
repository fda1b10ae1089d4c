use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default `info` filter.
/// Output goes to stderr so binaries can keep stdout for JSON.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("init tracing subscriber: {e}"))
}
