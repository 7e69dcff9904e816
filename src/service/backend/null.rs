use async_trait::async_trait;
use tracing::trace;

use crate::errors::Result;
use crate::service::{Command, ServiceState};

use super::ServiceBackend;

/// Backend of the basic service: no commands, no published state
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

#[async_trait]
impl ServiceBackend for NullBackend {
    fn name(&self) -> &'static str {
        "basic"
    }

    async fn on_start(&mut self, state: &ServiceState) -> Result<()> {
        trace!("NullBackend.on_start called, version {}", state.version);
        Ok(())
    }

    async fn poll_commands(&mut self) -> Result<Vec<Command>> {
        Ok(Vec::new())
    }

    async fn on_state_change(&mut self, state: &ServiceState) -> Result<()> {
        trace!("NullBackend.on_state_change called, running={}", state.running);
        Ok(())
    }

    async fn on_stop(&mut self) -> Result<()> {
        trace!("NullBackend.on_stop called, but no action taken");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[tokio::test]
    async fn test_null_backend_is_silent() {
        let mut backend = NullBackend;
        let state = ServiceState {
            version: "0.0.1".to_string(),
            delay: 1.0,
            logging_level: LogLevel::Debug,
            running: false,
        };

        assert_eq!(backend.name(), "basic");
        assert!(backend.on_start(&state).await.is_ok());
        assert!(backend.poll_commands().await.unwrap().is_empty());
        assert!(backend.on_state_change(&state).await.is_ok());
        assert!(backend.on_stop().await.is_ok());
    }
}
