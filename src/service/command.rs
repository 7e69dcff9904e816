//! Control messages
//!
//! Wire format: UTF-8 text, surrounding whitespace trimmed, fields separated
//! by `::`. The first field is the command, the rest are its parameters:
//! `delay::2.5`, `exit`, `logging_level::WARNING`.

use std::fmt;

pub const SEPARATOR: &str = "::";

/// Commands the service loop handles itself
pub const CMD_EXIT: &str = "exit";
pub const CMD_DELAY: &str = "delay";
pub const CMD_LOGGING_LEVEL: &str = "logging_level";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Command {
    pub name: String,
    pub params: Vec<String>,
}

impl Command {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Parse a message payload. Never fails: an empty payload is the
    /// empty command with no parameters.
    pub fn parse(payload: &str) -> Self {
        let mut parts = payload.trim().split(SEPARATOR).map(str::to_string);
        let name = parts.next().unwrap_or_default();
        Self {
            name,
            params: parts.collect(),
        }
    }

    pub fn to_payload(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.params.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_payload())
    }
}

impl From<&str> for Command {
    fn from(payload: &str) -> Self {
        Command::parse(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_only() {
        let cmd = Command::parse("exit");
        assert_eq!(cmd.name, "exit");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_parse_with_params_and_whitespace() {
        let cmd = Command::parse("  delay::1.2\n");
        assert!(cmd.is(CMD_DELAY));
        assert_eq!(cmd.param(0), Some("1.2"));
        assert_eq!(cmd.param(1), None);
    }

    #[test]
    fn test_parse_blank_payload() {
        let cmd = Command::parse(" ");
        assert_eq!(cmd.name, "");
        assert!(cmd.params.is_empty());
    }

    #[test]
    fn test_parse_keeps_empty_fields() {
        let cmd = Command::parse("set::::x");
        assert_eq!(cmd.params, vec!["".to_string(), "x".to_string()]);
    }

    #[test]
    fn test_payload_joins_fields() {
        let cmd = Command::new("scale", vec!["a".into(), "2".into()]);
        assert_eq!(cmd.to_payload(), "scale::a::2");
        assert_eq!(cmd.to_string(), "scale::a::2");
        assert_eq!(Command::parse(&cmd.to_payload()), cmd);
    }
}
