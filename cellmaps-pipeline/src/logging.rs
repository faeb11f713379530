//! Logging initialization for pipeline consumers.

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes a global tracing subscriber.
///
/// The filter honors `RUST_LOG` and falls back to the given default
/// directive. Safe to call more than once; later calls are no-ops.
pub fn init_logging(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging("debug");
        init_logging("info");
    }
}
