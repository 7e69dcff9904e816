use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, ServiceError};
use crate::logging::LogLevel;

/// Config file looked up when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "nts-service.toml";

/// Environment variable prefix, e.g. `NTS__SERVICE__DELAY=2.5`
pub const ENV_PREFIX: &str = "NTS";

/// Worker configuration (TOML file + environment)
///
/// Priority: ENV > config file > defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct WorkerConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

impl WorkerConfig {
    /// Load configuration from `path` (or the default file when present)
    /// and the `NTS__*` environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Same as [`WorkerConfig::load`] but reads environment overrides from
    /// `env` instead of the process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self> {
        use config::{Config, Environment, File};

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false),
        };

        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        let config: WorkerConfig = settings.try_deserialize()?;
        super::validators::validate(&config)?;
        Ok(config)
    }

    /// Render the defaults as a TOML document
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(ServiceError::from)
    }
}

/// Worker identity and loop settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
    /// Main loop sleep in seconds
    #[serde(default = "default_delay")]
    pub delay: f64,
    #[serde(default = "default_worker_id")]
    pub worker_id: u32,
    #[serde(default = "default_logging_level")]
    pub logging_level: String,
}

impl ServiceConfig {
    /// Configured level; unknown names fall back to DEBUG
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse_lenient(&self.logging_level)
    }
}

/// Redis connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_log_stream")]
    pub log_stream: String,
    #[serde(default = "default_stream_logs")]
    pub stream_logs: bool,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
}

/// Process level settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemConfig {
    #[serde(default)]
    pub pid_file: Option<String>,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

// ============================================================
// Default value functions
// ============================================================

fn default_service_name() -> String {
    "service".to_string()
}

fn default_service_version() -> String {
    "0.0.1".to_string()
}

fn default_delay() -> f64 {
    5.0
}

fn default_worker_id() -> u32 {
    1
}

fn default_logging_level() -> String {
    LogLevel::Debug.to_string()
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_log_stream() -> String {
    crate::logging::DEFAULT_LOG_STREAM.to_string()
}

fn default_stream_logs() -> bool {
    true
}

fn default_connect_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_enable_rotation() -> bool {
    true
}

fn default_max_backups() -> u32 {
    5
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
            delay: default_delay(),
            worker_id: default_worker_id(),
            logging_level: default_logging_level(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            db: 0,
            username: None,
            password: None,
            log_stream: default_log_stream(),
            stream_logs: default_stream_logs(),
            connect_retries: default_connect_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            file: None,
            enable_rotation: default_enable_rotation(),
            max_backups: default_max_backups(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            pid_file: None,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}
