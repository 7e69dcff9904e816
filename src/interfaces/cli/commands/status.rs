//! Status command - show the status hash of a service

use std::collections::HashMap;

use colored::Colorize;

use crate::broker;
use crate::config::RedisConfig;
use crate::interfaces::cli::CliError;
use crate::logging::LogLevel;

/// Fields in display order
const FIELDS: [&str; 4] = ["version", "running", "delay", "logging_level"];

pub async fn service_status(
    redis: &RedisConfig,
    service: &str,
    json: bool,
) -> Result<(), CliError> {
    let (_client, mut conn) = broker::connect(redis).await?;
    let fields = broker::status::read_status(&mut conn, service).await?;

    if fields.is_empty() && !json {
        println!("{} No status found for '{}'", "ℹ".bold().blue(), service);
        return Ok(());
    }

    println!("{}", render_status(service, &fields, json)?);
    Ok(())
}

/// Format a status hash for the terminal, or as a JSON object
pub fn render_status(
    service: &str,
    fields: &HashMap<String, String>,
    json: bool,
) -> Result<String, CliError> {
    if json {
        let mut object = serde_json::Map::new();
        object.insert("service".to_string(), service.into());
        for (key, value) in fields {
            object.insert(key.clone(), value.as_str().into());
        }
        return serde_json::to_string_pretty(&object)
            .map_err(|e| CliError::ParseError(e.to_string()));
    }

    let mut lines = vec![format!("{} {}", "Service".bold().green(), service.bold())];
    for key in FIELDS {
        let Some(value) = fields.get(key) else { continue };
        let shown = match key {
            "running" if value == "1" => "yes".green().to_string(),
            "running" => "no".yellow().to_string(),
            "logging_level" => describe_level(value),
            "delay" => format!("{}s", value),
            _ => value.clone(),
        };
        lines.push(format!("  {:<14} {}", format!("{}:", key).cyan(), shown));
    }

    let mut extra: Vec<_> = fields
        .iter()
        .filter(|(k, _)| !FIELDS.contains(&k.as_str()))
        .collect();
    extra.sort();
    for (key, value) in extra {
        lines.push(format!("  {:<14} {}", format!("{}:", key).cyan(), value.dimmed()));
    }
    Ok(lines.join("\n"))
}

fn describe_level(value: &str) -> String {
    match value.parse::<LogLevel>() {
        Ok(level) => format!("{} ({})", level, value),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> HashMap<String, String> {
        [
            ("version", "1.0.1"),
            ("delay", "0.5"),
            ("logging_level", "20"),
            ("running", "1"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_render_json() {
        let rendered = render_status("collector", &fields(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["service"], "collector");
        assert_eq!(value["running"], "1");
        assert_eq!(value["logging_level"], "20");
    }

    #[test]
    fn test_render_text() {
        let rendered = render_status("collector", &fields(), false).unwrap();
        assert!(rendered.contains("collector"));
        assert!(rendered.contains("1.0.1"));
        assert!(rendered.contains("INFO (20)"));
        assert!(rendered.contains("0.5s"));
    }

    #[test]
    fn test_describe_unknown_level() {
        assert_eq!(describe_level("77"), "77");
    }
}
