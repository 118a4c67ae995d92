//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Levels come from `RUST_LOG`:
//!
//! ```bash
//! # lifecycle events, publish/consume failures
//! RUST_LOG=info cargo run
//!
//! # every published record and received event, with payloads
//! RUST_LOG=debug cargo run
//!
//! # per-delivery broker internals
//! RUST_LOG=sync_framework=trace cargo run
//! ```
//!
//! Log lines carry structured fields instead of module paths: `queue`, `route`,
//! `record_type`, `order_id`, `shipment_id`, `tag`.

use tracing_subscriber::EnvFilter;

/// Initializes compact structured logging. Defaults to `info` when `RUST_LOG`
/// is unset.
///
/// Calling it twice is harmless; the second call leaves the first subscriber in
/// place.
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
