//! # Animica telemetry
//!
//! A single entry point, `init_tracing`, that every `animica-node` binary
//! calls once before doing anything else. Library crates only use
//! `tracing`'s macros; they never configure a subscriber themselves.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Installs the global `tracing` subscriber: a JSON `fmt` layer on stderr
/// with RFC3339 UTC timestamps, filtered by `RUST_LOG` (defaulting to
/// `"info"`), with a `tracing-log` bridge so dependencies still emitting
/// through the `log` facade land in the same stream.
///
/// Idempotent to call at most once per process; a second call returns an
/// error from `tracing::subscriber::set_global_default` rather than
/// panicking.
pub fn init_tracing() -> Result<(), anyhow::Error> {
    let fmt_layer = fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    tracing_log::LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
