//! Diagnostic logging for the reporter.
//!
//! Output goes to stderr so that package managers capturing stdout stay clean.

use anyhow::Result;
use clap::ValueEnum;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Log level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - very verbose
    Trace,
    /// Debug level - every decision the reporter takes
    Debug,
    /// Info level - outcome of the run
    Info,
    /// Warn level - failures only (default)
    #[default]
    Warn,
    /// Error level - errors only
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Initialize the tracing subscriber for logging
pub fn init(level: LogLevel) -> Result<()> {
    let filter = EnvFilter::try_new(level.as_str())
        .or_else(|_| EnvFilter::try_new(LogLevel::default().as_str()))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
