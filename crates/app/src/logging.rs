//! Tracing subscriber setup

use anyhow::anyhow;
use punchsync_domain::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level; `verbose` raises the configured level to `debug`.
pub fn init(config: &LoggingConfig, verbose: bool) -> anyhow::Result<()> {
    let default_directive = if verbose { "debug" } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|err| anyhow!("invalid log filter {default_directive:?}: {err}"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if config.json { builder.json().try_init() } else { builder.try_init() };
    installed.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
