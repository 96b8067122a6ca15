//! Diagnostic tracing, separate from the product event log.
//!
//! - **Tracing (this module)**: `HOOKLOOP_LOG` filter, stderr, compact.
//!   Off when the variable is unset.
//! - **Event log (`.claude/loop-log.md`)**: loop transitions, always written.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_ENV: &str = "HOOKLOOP_LOG";

/// Install the global subscriber. `HOOKLOOP_LOG=hookloop_bridge=debug` etc.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
