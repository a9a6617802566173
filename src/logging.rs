//! Structured logging and tracing for Orrery
//!
//! Console and file output through the tracing ecosystem. Components get a
//! named [`StructuredLogger`] via [`get_logger`]; initialization happens once
//! at startup from the loaded configuration.

use crate::config::LoggingConfig;
use crate::error::{OrreryError, Result};
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Once;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, fmt};

mod structured;

pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

// Keep the non-blocking worker guard alive for the entire process lifetime
static LOG_GUARD: OnceCell<WorkerGuard> = OnceCell::new();
static INIT_ONCE: Once = Once::new();
static INIT_ERROR: OnceCell<String> = OnceCell::new();

/// Parse a configured log level string
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(OrreryError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("orrery={},tower_http=warn,hyper=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("ORRERY_DISABLE_FILE_LOG").is_some()
}

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let level = parse_log_level(&config.level)?;

            let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

            if config.console_output || should_use_console_only() {
                layers.push(console_layer(config.json_format, level));
            }

            if !should_use_console_only() {
                layers.push(file_layer(&config.file, config.json_format, level)?);
            }

            let _ = tracing_subscriber::registry().with(layers).try_init();
            Ok(())
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(OrreryError::config(err.clone()));
    }
    Ok(())
}

fn console_layer(json_format: bool, level: Level) -> Box<dyn Layer<Registry> + Send + Sync> {
    if json_format {
        fmt::layer()
            .json()
            .with_target(false)
            .with_filter(build_env_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_filter(build_env_filter(level))
            .boxed()
    }
}

fn file_layer(
    file: &str,
    json_format: bool,
    level: Level,
) -> Result<Box<dyn Layer<Registry> + Send + Sync>> {
    let path = Path::new(file);
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
    let file_name = path
        .file_name()
        .ok_or_else(|| OrreryError::config(format!("Invalid log file path: {}", file)))?;

    let appender = rolling::never(directory.unwrap_or_else(|| Path::new(".")), file_name);
    let (writer, guard) = non_blocking(appender);
    let _ = LOG_GUARD.set(guard);

    let layer = if json_format {
        fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(build_env_filter(level))
            .boxed()
    } else {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(build_env_filter(level))
            .boxed()
    };
    Ok(layer)
}
