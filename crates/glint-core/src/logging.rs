//! Logging setup based on `tracing-subscriber`.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,glint_text=debug,cosmic_text=warn";

/// Install a formatting subscriber, honouring `RUST_LOG` when present.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter)
}

/// Install a formatting subscriber with an explicit filter.
pub fn init_with_filter(filter: impl Into<EnvFilter>) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter.into())
        .try_init()
        .is_ok()
}
