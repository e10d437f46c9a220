//! Logging bootstrap for applications embedding the engine.
//!
//! Every engine crate logs through `tracing` with an `event` field naming
//! what happened (`rules_loaded`, `plan_committed`, `stale_version`, ...).
//! Call [`init`] once at startup to print those events to stderr.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static INIT: OnceLock<bool> = OnceLock::new();

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times - only the first call has effect. Returns
/// false when another global subscriber was already installed.
pub fn init() -> bool {
    *INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init();
        assert_eq!(init(), first);
    }
}
