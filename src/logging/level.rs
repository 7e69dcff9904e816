//! Service log levels
//!
//! Levels use the numeric scale workers report in their status hash
//! (`10` debug up to `50` critical) and accept the short aliases operators
//! type on the control channel (`D`, `DBG`, `WARN`, ...).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};
use tracing::level_filters::LevelFilter;

use crate::errors::{Result, ServiceError};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Numeric value stored in the status hash
    pub fn value(self) -> u8 {
        match self {
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// Three-letter tag used in console lines and the log stream
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Info => "INF",
            Self::Warning => "WRN",
            Self::Error => "ERR",
            Self::Critical => "CRT",
        }
    }

    /// Parse a level, falling back to `Debug` for anything unrecognised.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warning => LevelFilter::WARN,
            // tracing has nothing above ERROR
            Self::Error | Self::Critical => LevelFilter::ERROR,
        }
    }

    pub fn from_tracing(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Self::Debug,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "D" | "DBG" | "DEBUG" | "10" => Ok(Self::Debug),
            "I" | "INF" | "INFO" | "INFORMATION" | "20" => Ok(Self::Info),
            "W" | "WRN" | "WARN" | "WARNING" | "30" => Ok(Self::Warning),
            "E" | "ERR" | "ERROR" | "40" => Ok(Self::Error),
            "C" | "CRT" | "CRIT" | "CRITICAL" | "F" | "FTL" | "FAT" | "FATAL" | "50" => {
                Ok(Self::Critical)
            }
            _ => Err(ServiceError::validation(format!(
                "Invalid log level: '{}'. Valid: DEBUG, INFO, WARNING, ERROR, CRITICAL",
                s
            ))),
        }
    }
}
