use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{ServiceConfig, validate_delay};
use crate::errors::Result;
use crate::logging::{LevelHandle, LogLevel};

/// Milliseconds since the Unix epoch
pub fn time_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// State published by the backend (the Redis status hash)
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceState {
    pub version: String,
    pub delay: f64,
    pub logging_level: LogLevel,
    pub running: bool,
}

impl ServiceState {
    /// Hash fields in publication order
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("version", self.version.clone()),
            ("delay", self.delay.to_string()),
            ("logging_level", self.logging_level.value().to_string()),
            ("running", if self.running { "1" } else { "0" }.to_string()),
        ]
    }
}

/// Runtime state of a service, handed to every worker hook
#[derive(Debug)]
pub struct ServiceContext {
    name: String,
    version: String,
    worker_id: u32,
    delay: f64,
    logging_level: LogLevel,
    level_handle: LevelHandle,
    running: bool,
    exit: bool,
    state_changed: bool,
    /// Start time of the last completed cycle
    pub last_loop_timestamp_ms: i64,
}

impl ServiceContext {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            name: config.name.clone(),
            version: config.version.clone(),
            worker_id: config.worker_id,
            delay: validate_delay(config.delay)?,
            logging_level: config.log_level(),
            level_handle: LevelHandle::detached(),
            running: false,
            exit: false,
            state_changed: false,
            last_loop_timestamp_ms: time_ms(),
        })
    }

    pub fn with_level_handle(mut self, handle: LevelHandle) -> Self {
        self.level_handle = handle;
        self
    }

    pub fn service_name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn worker_id(&self) -> u32 {
        self.worker_id
    }

    /// `<service>:<worker_id>`
    pub fn worker_name(&self) -> String {
        format!("{}:{}", self.name, self.worker_id)
    }

    /// Main loop sleep in seconds
    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub(crate) fn delay_duration(&self) -> Duration {
        // every write goes through validate_delay
        Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::ZERO)
    }

    /// Change the main loop sleep. Negative values and values too large for
    /// a `Duration` are rejected and the current delay is kept.
    pub fn set_delay(&mut self, delay: f64) -> Result<()> {
        self.delay = validate_delay(delay)?;
        self.state_changed = true;
        debug!("Delay changed to {}", self.delay);
        Ok(())
    }

    pub fn logging_level(&self) -> LogLevel {
        self.logging_level
    }

    /// Change the active log level of the whole process
    pub fn set_logging_level(&mut self, level: LogLevel) {
        self.logging_level = level;
        self.state_changed = true;
        if let Err(e) = self.level_handle.set(level) {
            warn!("{}", e);
        }
        debug!("Logging level set to {}", level);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Stop the loop before its next step
    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    pub fn state(&self) -> ServiceState {
        ServiceState {
            version: self.version.clone(),
            delay: self.delay,
            logging_level: self.logging_level,
            running: self.running,
        }
    }

    /// Whether delay or level changed since the last call
    pub(crate) fn take_state_change(&mut self) -> bool {
        std::mem::take(&mut self.state_changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ServiceError;

    fn context() -> ServiceContext {
        ServiceContext::new(&ServiceConfig {
            name: "svc".to_string(),
            version: "1.0.1".to_string(),
            delay: 0.5,
            worker_id: 3,
            logging_level: "INFO".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_new_reads_config() {
        let ctx = context();
        assert_eq!(ctx.service_name(), "svc");
        assert_eq!(ctx.worker_name(), "svc:3");
        assert_eq!(ctx.delay(), 0.5);
        assert_eq!(ctx.logging_level(), LogLevel::Info);
        assert!(!ctx.is_running());
        assert!(!ctx.exit_requested());
    }

    #[test]
    fn test_new_rejects_negative_delay() {
        let config = ServiceConfig {
            delay: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            ServiceContext::new(&config),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_set_delay_validates() {
        let mut ctx = context();
        assert!(ctx.set_delay(-2.0).is_err());
        assert_eq!(ctx.delay(), 0.5);
        assert!(!ctx.take_state_change());

        ctx.set_delay(1.2).unwrap();
        assert_eq!(ctx.delay(), 1.2);
        assert!(ctx.take_state_change());
        assert!(!ctx.take_state_change());
    }

    #[test]
    fn test_state_fields() {
        let mut ctx = context();
        ctx.set_running(true);
        ctx.set_logging_level(LogLevel::Warning);

        let fields = ctx.state().fields();
        assert_eq!(
            fields,
            vec![
                ("version", "1.0.1".to_string()),
                ("delay", "0.5".to_string()),
                ("logging_level", "30".to_string()),
                ("running", "1".to_string()),
            ]
        );
    }
}
