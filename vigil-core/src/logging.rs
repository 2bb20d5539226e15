//! Tracing bootstrap for binaries and tests embedding the checks.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Install a global fmt subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Calling this
/// more than once is harmless; later calls keep the first subscriber.
pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = match format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };
}
