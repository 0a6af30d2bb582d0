//! # Observability
//!
//! Structured logging for test binaries via the tracing ecosystem. Poll
//! attempts, cleanup failures and credential lifecycle events all emit
//! structured fields so a failing run can be diagnosed from logs alone.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Initialize logging for a test binary. Idempotent; respects `RUST_LOG`
/// and defaults to `info`.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
