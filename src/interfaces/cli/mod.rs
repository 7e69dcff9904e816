//! CLI interface module
//!
//! Operator commands talking to running workers through Redis.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::config::WorkerConfig;
use crate::errors::ServiceError;

#[derive(Debug)]
pub enum CliError {
    RedisError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    pub fn format_simple(&self) -> String {
        match self {
            CliError::RedisError(msg) => format!("Redis error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::RedisError(msg) => {
                format!("{} {}", "Redis error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<ServiceError> for CliError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RedisConnection(msg) | ServiceError::RedisOperation(msg) => {
                CliError::RedisError(msg)
            }
            ServiceError::Serialization(msg) | ServiceError::Validation(msg) => {
                CliError::ParseError(msg)
            }
            other => CliError::CommandError(other.to_string()),
        }
    }
}

/// Run an operator command (everything except `run`)
pub async fn run_cli_command(cmd: Commands, config: &WorkerConfig) -> Result<(), CliError> {
    match cmd {
        Commands::Send {
            service,
            command,
            params,
        } => commands::send_command(&config.redis, &service, command, params).await,

        Commands::Status { service, json } => {
            commands::service_status(&config.redis, &service, json).await
        }

        Commands::Config { action } => match action {
            ConfigCommands::Generate { output, force } => commands::config_generate(output, force),
        },

        Commands::Run { .. } => Err(CliError::CommandError(
            "`run` is not an operator command".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_mapping() {
        let err: CliError = ServiceError::redis_connection("refused").into();
        assert!(matches!(err, CliError::RedisError(ref m) if m == "refused"));

        let err: CliError = ServiceError::validation("bad").into();
        assert_eq!(err.format_simple(), "Parse error: bad");

        let err: CliError = ServiceError::worker("boom").into();
        assert_eq!(err.format_simple(), "Command error: Worker Error: boom");
    }
}
