use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize the logging system with tracing.
///
/// If `log_dir` is provided, logs are also written to a daily rolling file
/// there. `RUST_LOG` overrides the level chosen by `verbose`. Keep the
/// returned guard alive until exit so buffered file lines are flushed.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("fotobox=debug,warn")
        } else {
            EnvFilter::new("fotobox=info,warn")
        }
    });

    let registry = tracing_subscriber::registry().with(filter);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "fotobox.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        registry
            .with(fmt::layer().with_target(true))
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init()?;
        Ok(Some(guard))
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
        Ok(None)
    }
}
