//! Logging setup: `tracing` with an environment-driven filter, a
//! JSON/pretty format switch and stdout/stderr output selection.
//!
//! Notifications are the kernel's user-facing channel; logs stay on
//! stderr by default so a host wrapping stdout never sees them. The
//! active level filter sits behind a reload handle so the `%log`
//! directive can swap it at runtime.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::env;
use std::io;
use tracing_subscriber::{
    EnvFilter, Registry, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

static FILTER_HANDLE: OnceCell<reload::Handle<EnvFilter, Registry>> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub output: LogOutput,
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            output: LogOutput::Stderr,
            default_filter: "shacl_kernel=info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(format) = env::var("SHACL_KERNEL_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => config.format = LogFormat::Json,
                "pretty" => config.format = LogFormat::Pretty,
                _ => {}
            }
        }
        if let Ok(output) = env::var("SHACL_KERNEL_LOG_OUTPUT") {
            match output.to_lowercase().as_str() {
                "stdout" => config.output = LogOutput::Stdout,
                "stderr" => config.output = LogOutput::Stderr,
                _ => {}
            }
        }
        config
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))
        .context("invalid log filter")?;
    let (filter, handle) = reload::Layer::new(filter);

    match (config.format, config.output) {
        (LogFormat::Json, LogOutput::Stdout) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stdout))
            .try_init(),
        (LogFormat::Json, LogOutput::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init(),
        (LogFormat::Pretty, LogOutput::Stdout) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stdout))
            .try_init(),
        (LogFormat::Pretty, LogOutput::Stderr) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init(),
    }
    .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    let _ = FILTER_HANDLE.set(handle);
    Ok(())
}

/// Swap the active level filter. Accepts the session's level names
/// (`critical`/`warning` map onto `error`/`warn`). A no-op until
/// [`init_logging`] has run.
pub fn set_level(level: &str) -> Result<()> {
    let directive = match level {
        "critical" => "error",
        "warning" => "warn",
        other => other,
    };
    if let Some(handle) = FILTER_HANDLE.get() {
        let filter = EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log level {level:?}"))?;
        handle
            .reload(filter)
            .context("failed to reload log filter")?;
    }
    Ok(())
}
