//! Logging system initialization
//!
//! Workers log through `tracing`. The subscriber installed here combines:
//! - a reloadable level filter, so the level can change while running
//! - console / file output in the worker line format (or JSON)
//! - an optional Redis stream sink shared by every worker of a deployment

pub mod console;
pub mod level;
pub mod redis_stream;

use std::path::Path;
use std::time::Duration;

use tracing::level_filters::LevelFilter;
use tracing_appender::rolling;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, fmt, reload};

pub use console::{CONSOLE_TIME_FORMAT, ConsoleFormat};
pub use level::LogLevel;
pub use redis_stream::{DEFAULT_LOG_STREAM, LogEntry, RedisStreamLayer, StreamFlusher};

use crate::config::LoggingConfig;
use crate::errors::{Result, ServiceError};

type FilterLayer = reload::Layer<LevelFilter, Registry>;
type BaseSubscriber = Layered<FilterLayer, Registry>;

/// Who is logging: rendered as `[name:worker_id]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIdentity {
    pub service_name: String,
    pub worker_id: u32,
}

/// Changes the active level of the installed subscriber
#[derive(Clone, Default)]
pub struct LevelHandle {
    inner: Option<reload::Handle<LevelFilter, Registry>>,
}

impl LevelHandle {
    /// Handle not attached to any subscriber; `set` only succeeds silently
    pub fn detached() -> Self {
        Self { inner: None }
    }

    pub fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    pub fn set(&self, level: LogLevel) -> Result<()> {
        if let Some(handle) = &self.inner {
            handle
                .reload(level.to_level_filter())
                .map_err(|e| ServiceError::config(format!("Failed to change log level: {}", e)))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for LevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelHandle")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Keeps the logging pipeline alive; hold it for the lifetime of the program
pub struct LoggingGuard {
    _appender: tracing_appender::non_blocking::WorkerGuard,
    flusher: Option<StreamFlusher>,
    level: LevelHandle,
}

impl LoggingGuard {
    pub fn level_handle(&self) -> LevelHandle {
        self.level.clone()
    }

    /// Wait for queued stream records to reach Redis (no-op without a stream)
    pub async fn flush(&self, timeout: Duration) -> bool {
        match &self.flusher {
            Some(flusher) => flusher.flush(timeout).await,
            None => true,
        }
    }
}

/// Build the console/file writer described by `config`
fn make_writer(config: &LoggingConfig) -> Result<Box<dyn std::io::Write + Send + Sync>> {
    let Some(log_file) = config.file.as_deref().filter(|f| !f.is_empty()) else {
        return Ok(Box::new(std::io::stdout()));
    };

    if config.enable_rotation {
        let path = Path::new(log_file);
        let dir = path.parent().unwrap_or(Path::new("."));
        let prefix = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("nts-service.log")
            .trim_end_matches(".log")
            .to_string();
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix(prefix)
            .filename_suffix("log")
            .max_log_files(config.max_backups.max(1) as usize)
            .build(dir)
            .map_err(|e| {
                ServiceError::file_operation(format!(
                    "Failed to create rolling log appender: {}",
                    e
                ))
            })?;
        Ok(Box::new(appender))
    } else {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        Ok(Box::new(file))
    }
}

/// Initialize the global subscriber.
///
/// Call once, after configuration is loaded. When `stream` is given, every
/// record is also shipped to the Redis log stream.
///
/// # Errors
/// * the log file or rolling appender cannot be created
/// * a global subscriber is already installed
pub fn init_logging(
    config: &LoggingConfig,
    identity: &LogIdentity,
    level: LogLevel,
    stream: Option<(RedisStreamLayer, StreamFlusher)>,
) -> Result<LoggingGuard> {
    let writer = make_writer(config)?;
    let to_console = config.file.as_ref().is_none_or(|f| f.is_empty());

    let (non_blocking_writer, appender_guard) = tracing_appender::non_blocking(writer);
    let (filter, filter_handle) = reload::Layer::new(level.to_level_filter());

    let output: Box<dyn Layer<BaseSubscriber> + Send + Sync> = if config.format == "json" {
        fmt::layer()
            .json()
            .with_writer(non_blocking_writer)
            .boxed()
    } else {
        fmt::layer()
            .event_format(ConsoleFormat::new(&identity.service_name, identity.worker_id))
            .with_writer(non_blocking_writer)
            .with_ansi(to_console)
            .boxed()
    };

    let (stream_layer, flusher) = match stream {
        Some((layer, flusher)) => (Some(layer), Some(flusher)),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .with(stream_layer)
        .try_init()
        .map_err(|e| ServiceError::config(format!("Failed to install logger: {}", e)))?;

    Ok(LoggingGuard {
        _appender: appender_guard,
        flusher,
        level: LevelHandle {
            inner: Some(filter_handle),
        },
    })
}
