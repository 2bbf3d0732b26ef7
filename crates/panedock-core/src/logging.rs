//! Structured logging.
//!
//! The engine logs through `tracing`; the macros are re-exported here so the
//! other panedock crates share one import path. Installing a subscriber is the
//! host's job. With the `tracing-json` feature, [`init_logging`] sets up a JSON
//! formatter filtered by an `EnvFilter` directive (for example
//! `"panedock_dock=debug"`).

pub use tracing::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

/// Failure to install the global subscriber.
#[cfg(feature = "tracing-json")]
#[derive(Debug, thiserror::Error)]
pub enum LoggingInitError {
    #[error("invalid filter directive: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Install a JSON tracing subscriber for the whole process.
#[cfg(feature = "tracing-json")]
pub fn init_logging(filter: &str) -> Result<(), LoggingInitError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|_| LoggingInitError::AlreadyInstalled)
}
