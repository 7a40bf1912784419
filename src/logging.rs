use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "BLINDTYPER_LOG";
pub const LOG_FILE: &str = "blindtyper.log";

/// Send tracing output to `dir/blindtyper.log`; the terminal belongs to the UI.
///
/// The filter comes from `BLINDTYPER_LOG` and defaults to `info`. Keep the
/// returned guard alive for as long as logs should be flushed. Returns `None`
/// if a global subscriber is already installed.
pub fn init(dir: &Path) -> std::io::Result<Option<WorkerGuard>> {
    fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
    {
        Ok(()) => Ok(Some(guard)),
        Err(_) => Ok(None),
    }
}
