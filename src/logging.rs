//! Sets up tracing for the binary.

use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::Error;

/// Log INFO and above to stdout, and DEBUG and above to the file at
/// `log_path`.
///
/// The stdout level can be changed with the `RUST_LOG` environment variable.
/// The log file is appended to, and created if it does not exist.
///
/// # Errors
///
/// Returns [Error::Logging] if the log file cannot be opened or a global
/// subscriber has already been set.
pub fn setup_logging(log_path: &Path) -> Result<(), Error> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .map_err(|error| {
            Error::Logging(format!("could not open {}: {error}", log_path.display()))
        })?;

    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(stdout_filter);

    let debug_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .try_init()
        .map_err(|error| Error::Logging(error.to_string()))
}
