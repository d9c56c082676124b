//! Structured logging initialization.
//!
//! The engine itself only emits `tracing` events; wiring a subscriber is the
//! embedding caller's job in production, but this helper mirrors the
//! teacher's one-shot `tracing-subscriber` setup for binaries/tests that
//! embed the engine directly.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize a global `tracing` subscriber reading level filters from
/// `RUST_LOG` (defaulting to `info`), emitting newline-delimited JSON.
///
/// Safe to call more than once; subsequent calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .json()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
