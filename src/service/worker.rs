//! Worker hooks
//!
//! A worker supplies the behaviour of a service; the service loop owns
//! scheduling, control messages and shutdown. Every hook has a no-op
//! default so a worker only implements what it needs.

use async_trait::async_trait;
use tracing::debug;

use crate::errors::Result;

use super::{Command, ServiceContext};

#[async_trait]
pub trait Worker: Send {
    /// Runs once before the first cycle. An error aborts startup.
    async fn initialize(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        Ok(())
    }

    /// Task queue step, runs every cycle before [`Worker::do_job`]
    async fn process_tasks(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        Ok(())
    }

    /// Main job, runs every cycle
    async fn do_job(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        Ok(())
    }

    /// Handle a command the service does not know.
    ///
    /// Returns `Ok(true)` when the command was executed.
    async fn execute_cmd(&mut self, _ctx: &mut ServiceContext, cmd: &Command) -> Result<bool> {
        debug!("CMD: {}, PAR: {:?}", cmd.name, cmd.params);
        Ok(false)
    }

    /// Runs once after the loop ends
    async fn cleanup(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        Ok(())
    }
}
