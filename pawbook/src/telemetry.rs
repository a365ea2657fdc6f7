//! Tracing initialization.
//!
//! Console logging via tracing-subscriber's fmt layer, filtered by
//! `RUST_LOG` (default `info`). Capacity accounting leans on structured log
//! records for its degraded modes (rollback failures, skipped releases), so
//! initialization happens before any store is built.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}
