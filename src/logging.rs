use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` overrides the default `info,streamdrop=debug` filter. Stdout is
/// left to the binary's own output.
pub fn init_logging() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,streamdrop=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!("streamdrop logging initialized");
    Ok(())
}
