use std::path::PathBuf;

use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    Stderr,
    /// The dashboard owns the terminal; log to a file or not at all.
    File(Option<PathBuf>),
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_logging(target: LogTarget) {
    match target {
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter("warn"))
                .with(layer)
                .try_init();
        }
        LogTarget::File(None) => {}
        LogTarget::File(Some(path)) => {
            let file = match std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
            {
                Ok(file) => file,
                Err(err) => {
                    eprintln!("cannot open log file {}: {err}", path.display());
                    return;
                }
            };

            let layer = fmt::layer()
                .json()
                .with_writer(std::sync::Mutex::new(file))
                .with_target(false);
            let _ = tracing_subscriber::registry()
                .with(env_filter("info"))
                .with(layer)
                .try_init();
        }
    }
}
