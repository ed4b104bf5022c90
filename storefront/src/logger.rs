//! Logging Infrastructure
//!
//! Console logging with `RUST_LOG`-style filtering. The state layer emits
//! structured `tracing` events; hosts embedding it can install their own
//! subscriber instead of calling this.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize console logging.
///
/// `level` is the default filter used when `RUST_LOG` is unset
/// (e.g. "info", "debug").
pub fn init_logger(level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    Ok(())
}
