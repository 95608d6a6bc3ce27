//! Process-wide tracing subscriber.

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// Install a JSON `fmt` subscriber filtered by `RUST_LOG`.
///
/// Calling this more than once, or after another subscriber was installed,
/// logs a warning and keeps the existing subscriber.
pub fn init_tracing() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }
}

#[cfg(test)]
mod tests {
    //! Repeated initialisation must not panic.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn init_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
