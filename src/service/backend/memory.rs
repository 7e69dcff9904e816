use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{Result, ServiceError};
use crate::service::{Command, ServiceState};

use super::ServiceBackend;

#[derive(Debug, Default)]
struct Shared {
    status: HashMap<String, String>,
    started: bool,
    stopped: bool,
}

/// In-process backend for embedding a service in another program
pub struct MemoryBackend {
    rx: mpsc::UnboundedReceiver<Command>,
    shared: Arc<Mutex<Shared>>,
}

/// Controls a [`MemoryBackend`] from outside the service loop
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    tx: mpsc::UnboundedSender<Command>,
    shared: Arc<Mutex<Shared>>,
}

impl MemoryBackend {
    pub fn new() -> (Self, MemoryHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                rx,
                shared: shared.clone(),
            },
            MemoryHandle { tx, shared },
        )
    }

    fn publish(&self, state: &ServiceState) {
        let mut shared = self.shared.lock();
        for (field, value) in state.fields() {
            shared.status.insert(field.to_string(), value);
        }
    }
}

impl MemoryHandle {
    /// Queue a raw payload, as if published on the command channel
    pub fn send(&self, payload: &str) -> Result<()> {
        self.send_command(Command::parse(payload))
    }

    pub fn send_command(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|e| ServiceError::worker(format!("Service is gone, {} dropped", e.0)))
    }

    /// Snapshot of the published status fields
    pub fn status(&self) -> HashMap<String, String> {
        self.shared.lock().status.clone()
    }

    pub fn status_field(&self, field: &str) -> Option<String> {
        self.shared.lock().status.get(field).cloned()
    }

    pub fn is_started(&self) -> bool {
        self.shared.lock().started
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.lock().stopped
    }
}

#[async_trait]
impl ServiceBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn on_start(&mut self, state: &ServiceState) -> Result<()> {
        self.publish(state);
        self.shared.lock().started = true;
        Ok(())
    }

    async fn poll_commands(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while let Ok(command) = self.rx.try_recv() {
            debug!("Got message: {}", command);
            commands.push(command);
        }
        Ok(commands)
    }

    async fn on_state_change(&mut self, state: &ServiceState) -> Result<()> {
        self.publish(state);
        Ok(())
    }

    async fn on_stop(&mut self) -> Result<()> {
        self.rx.close();
        self.shared.lock().stopped = true;
        Ok(())
    }
}
