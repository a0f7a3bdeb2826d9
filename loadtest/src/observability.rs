//! Logging setup shared by both binaries.

use std::env;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Installs the global tracing subscriber writing to stderr.
///
/// Log records emitted by goose through the `log` crate are forwarded to the same subscriber.
pub fn init_tracing() {
    let (level, env_filter) = parse_rust_log();
    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(format.with_filter(LevelFilter::from(level)))
        .with(env_filter)
        .init();
}

/// Derives the log level and filter from `RUST_LOG`.
///
/// A plain level such as `debug` is applied on top of the built-in per-crate defaults. Any other
/// value is used literally as an [`EnvFilter`] directive.
pub fn parse_rust_log() -> (Level, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<Level>() {
            Ok(level) => level,
            Err(_) => return (Level::TRACE, EnvFilter::new(value)),
        },
        Err(_) => Level::INFO,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        goose=INFO,\
        hyper=WARN,\
        reqwest=WARN,\
        smartsplit_loadtest=TRACE,\
        setup_test_users=TRACE,\
        ",
    );

    (level, env_filter)
}
