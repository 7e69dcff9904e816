//! Service backends
//!
//! A backend connects the service loop to the outside world: where
//! commands come from and where the service state is published.
//!
//! - `null`: nothing in, nothing out (basic service)
//! - `memory`: in-process channel and status map
//! - `redis`: pub/sub channel, status hash, time series

mod memory;
mod null;
mod redis_backend;

use async_trait::async_trait;

use crate::errors::Result;

use super::{Command, ServiceState};

pub use memory::{MemoryBackend, MemoryHandle};
pub use null::NullBackend;
pub use redis_backend::RedisBackend;

#[async_trait]
pub trait ServiceBackend: Send {
    fn name(&self) -> &'static str;

    /// Publish the initial state (`running` is false at this point)
    async fn on_start(&mut self, state: &ServiceState) -> Result<()>;

    /// Every command received since the last call, without waiting
    async fn poll_commands(&mut self) -> Result<Vec<Command>>;

    /// Publish a changed state
    async fn on_state_change(&mut self, state: &ServiceState) -> Result<()>;

    /// Release connections; called once after the worker cleaned up
    async fn on_stop(&mut self) -> Result<()>;
}
