//! tracing setup. The interactive screen owns the terminal, so there logs go
//! to a file or nowhere; one-shot runs log to stderr.

use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

impl LogTarget {
    /// `--log-file` always wins; otherwise stderr unless the terminal is ours.
    pub fn choose(log_file: Option<PathBuf>, interactive: bool) -> Self {
        match log_file {
            Some(p) => LogTarget::File(p),
            None if interactive => LogTarget::Off,
            None => LogTarget::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. A second call is a no-op.
pub fn init(target: &LogTarget) -> io::Result<()> {
    let layer = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_filter(env_filter())
            .boxed(),
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_filter(env_filter())
                .boxed()
        }
    };
    let _ = tracing_subscriber::registry().with(layer).try_init();
    Ok(())
}
