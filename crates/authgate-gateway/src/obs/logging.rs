//! Subscriber setup: console output filtered by `RUST_LOG` (default `info`),
//! plus an optional append-only detail file at debug level for authgate's
//! own targets.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter, Layer,
};

use authgate_core::error::{AuthGateError, Result};

const CONSOLE_DEFAULT: &str = "info";
const DETAIL_FILTER: &str = "info,authgate_core=debug,authgate_gateway=debug";

/// Install the global subscriber. `detail_log` adds the debug file layer.
pub fn init(detail_log: Option<&Path>) -> Result<()> {
    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(CONSOLE_DEFAULT)),
    );
    let detail = detail_log.map(detail_layer).transpose()?;

    tracing_subscriber::registry()
        .with(console)
        .with(detail)
        .try_init()
        .map_err(|e| AuthGateError::Startup(format!("logging init failed: {e}")))
}

/// Debug-level file layer, no ANSI colors. The file is created if missing
/// and appended to otherwise.
pub fn detail_layer<S>(path: &Path) -> Result<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file = open_append(path)?;
    Ok(fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_filter(EnvFilter::new(DETAIL_FILTER)))
}

fn open_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuthGateError::Startup(format!("open {} failed: {e}", path.display())))
}
