//! Tracing setup shared by GateCraft binaries and tests
//!
//! `RUST_LOG` overrides the default directives when set.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const DEFAULT_DIRECTIVES: &str = "info,gatecraft=debug";

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// Install a global fmt subscriber filtered by `directives`
pub fn init_with(directives: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter(directives))
        .try_init()?;
    tracing::debug!("logging initialized with {}", directives);
    Ok(())
}

pub fn init() -> Result<(), TryInitError> {
    init_with(DEFAULT_DIRECTIVES)
}

/// Test-writer subscriber. Safe to call from every test; only the first wins.
pub fn init_for_tests() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn,gatecraft_core=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        init_for_tests();
        assert!(init().is_err());
        // Repeat calls stay harmless
        init_for_tests();
    }
}
