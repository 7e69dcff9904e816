//! Send command - publish a control message on a service channel

use colored::Colorize;
use redis::AsyncCommands;

use crate::broker;
use crate::config::RedisConfig;
use crate::interfaces::cli::CliError;
use crate::service::Command;

pub async fn send_command(
    redis: &RedisConfig,
    service: &str,
    command: String,
    params: Vec<String>,
) -> Result<(), CliError> {
    if command.contains(crate::service::SEPARATOR) {
        return Err(CliError::ParseError(format!(
            "Command name must not contain '{}'",
            crate::service::SEPARATOR
        )));
    }

    let payload = Command::new(command, params).to_payload();
    let (_client, mut conn) = broker::connect(redis).await?;
    let receivers: i64 = conn
        .publish(service, &payload)
        .await
        .map_err(|e| CliError::RedisError(e.to_string()))?;

    if receivers == 0 {
        println!(
            "{} {} {}",
            "ℹ".bold().blue(),
            payload.yellow(),
            format!("sent to '{}', but no worker is listening", service).dimmed()
        );
    } else {
        println!(
            "{} {} sent to '{}' ({} receiver{})",
            "✓".bold().green(),
            payload.yellow(),
            service.cyan(),
            receivers,
            if receivers == 1 { "" } else { "s" }
        );
    }
    Ok(())
}
