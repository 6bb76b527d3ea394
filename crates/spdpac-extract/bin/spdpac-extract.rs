//! spdpac-extract binary entry point.
//!
//! Parses arguments, sets up logging on standard error and hands over to the
//! library. Any error ends the process with a non-zero status.

use anyhow::{Context, Result};
use spdpac_extract::ExtractConfig;

fn main() -> Result<()> {
    let config = ExtractConfig::from_args();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Configuration loaded: {:?}", config);

    spdpac_extract::run(&config, &mut std::io::stdout().lock())
        .with_context(|| format!("failed to process {}", config.input.display()))?;

    Ok(())
}
