use std::collections::HashMap;
use std::io::Write;

use nts_service::config::WorkerConfig;
use nts_service::errors::ServiceError;
use nts_service::logging::LogLevel;

fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_file_is_loaded() {
    let file = write_config(
        r#"
[service]
name = "collector"
version = "2.1.0"
delay = 0.25
worker_id = 4
logging_level = "WRN"

[redis]
host = "redis.internal"
port = 6380
db = 3
password = "secret"
log_stream = "collector_logs"
stream_logs = false

[logging]
format = "json"

[system]
pid_file = "/run/collector.pid"
shutdown_timeout_secs = 5
"#,
    );

    let config = WorkerConfig::load_with_env(Some(file.path()), env(&[])).unwrap();

    assert_eq!(config.service.name, "collector");
    assert_eq!(config.service.worker_id, 4);
    assert_eq!(config.service.log_level(), LogLevel::Warning);
    assert_eq!(config.redis.host, "redis.internal");
    assert_eq!(config.redis.db, 3);
    assert_eq!(config.redis.password.as_deref(), Some("secret"));
    assert!(!config.redis.stream_logs);
    assert_eq!(config.logging.format, "json");
    assert_eq!(config.system.pid_file.as_deref(), Some("/run/collector.pid"));
    assert_eq!(config.system.shutdown_timeout_secs, 5);
}

#[test]
fn test_env_overrides_file() {
    let file = write_config("[redis]\nhost = \"from-file\"\n");

    let config = WorkerConfig::load_with_env(
        Some(file.path()),
        env(&[
            ("NTS__REDIS__HOST", "from-env"),
            ("NTS__SERVICE__NAME", "env-worker"),
        ]),
    )
    .unwrap();

    assert_eq!(config.redis.host, "from-env");
    assert_eq!(config.service.name, "env-worker");
}

#[test]
fn test_unknown_log_format_rejected() {
    let file = write_config("[logging]\nformat = \"xml\"\n");

    let result = WorkerConfig::load_with_env(Some(file.path()), env(&[]));
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test]
fn test_empty_service_name_rejected() {
    let file = write_config("[service]\nname = \"\"\n");

    let result = WorkerConfig::load_with_env(Some(file.path()), env(&[]));
    assert!(matches!(result, Err(ServiceError::Validation(_))));
}

#[test]
fn test_malformed_file_is_config_error() {
    let file = write_config("[service\nname = ");

    let result = WorkerConfig::load_with_env(Some(file.path()), env(&[]));
    assert!(matches!(result, Err(ServiceError::Config(_))));
}
