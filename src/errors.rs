use std::fmt;

#[derive(Debug, Clone)]
pub enum ServiceError {
    RedisConnection(String),
    RedisOperation(String),
    TimeSeries(String),
    Config(String),
    Validation(String),
    FileOperation(String),
    SignalOperation(String),
    Worker(String),
    Serialization(String),
}

impl ServiceError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::RedisConnection(_) => "E001",
            ServiceError::RedisOperation(_) => "E002",
            ServiceError::TimeSeries(_) => "E003",
            ServiceError::Config(_) => "E004",
            ServiceError::Validation(_) => "E005",
            ServiceError::FileOperation(_) => "E006",
            ServiceError::SignalOperation(_) => "E007",
            ServiceError::Worker(_) => "E008",
            ServiceError::Serialization(_) => "E009",
        }
    }

    /// Human readable error category
    pub fn error_type(&self) -> &'static str {
        match self {
            ServiceError::RedisConnection(_) => "Redis Connection Error",
            ServiceError::RedisOperation(_) => "Redis Operation Error",
            ServiceError::TimeSeries(_) => "Time Series Error",
            ServiceError::Config(_) => "Configuration Error",
            ServiceError::Validation(_) => "Validation Error",
            ServiceError::FileOperation(_) => "File Operation Error",
            ServiceError::SignalOperation(_) => "Signal Operation Error",
            ServiceError::Worker(_) => "Worker Error",
            ServiceError::Serialization(_) => "Serialization Error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ServiceError::RedisConnection(msg)
            | ServiceError::RedisOperation(msg)
            | ServiceError::TimeSeries(msg)
            | ServiceError::Config(msg)
            | ServiceError::Validation(msg)
            | ServiceError::FileOperation(msg)
            | ServiceError::SignalOperation(msg)
            | ServiceError::Worker(msg)
            | ServiceError::Serialization(msg) => msg,
        }
    }

    /// Colored rendering for terminal output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// Whether the error came from a lost or refused Redis connection
    pub fn is_connection(&self) -> bool {
        matches!(self, ServiceError::RedisConnection(_))
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn redis_connection<T: Into<String>>(msg: T) -> Self {
        ServiceError::RedisConnection(msg.into())
    }

    pub fn redis_operation<T: Into<String>>(msg: T) -> Self {
        ServiceError::RedisOperation(msg.into())
    }

    pub fn time_series<T: Into<String>>(msg: T) -> Self {
        ServiceError::TimeSeries(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ServiceError::Config(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ServiceError::Validation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ServiceError::FileOperation(msg.into())
    }

    pub fn signal_operation<T: Into<String>>(msg: T) -> Self {
        ServiceError::SignalOperation(msg.into())
    }

    pub fn worker<T: Into<String>>(msg: T) -> Self {
        ServiceError::Worker(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ServiceError::Serialization(msg.into())
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(err: redis::RedisError) -> Self {
        if crate::broker::retry::is_retryable_error(&err) {
            ServiceError::RedisConnection(err.to_string())
        } else {
            ServiceError::RedisOperation(err.to_string())
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::FileOperation(err.to_string())
    }
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ServiceError {
    fn from(err: toml::ser::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
