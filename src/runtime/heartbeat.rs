use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::Result;
use crate::service::{Command, ServiceContext, Worker, time_ms};

/// Worker run by `nts-service run`: logs every cycle and answers `ping`.
///
/// Useful to check a deployment end to end (config, Redis, log stream,
/// control channel) before shipping a real worker.
#[derive(Debug, Default)]
pub struct HeartbeatWorker {
    beats: u64,
    pings: u64,
}

impl HeartbeatWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    pub fn pings(&self) -> u64 {
        self.pings
    }
}

#[async_trait]
impl Worker for HeartbeatWorker {
    async fn initialize(&mut self, ctx: &mut ServiceContext) -> Result<()> {
        info!("Heartbeat worker {} ready", ctx.worker_name());
        Ok(())
    }

    async fn do_job(&mut self, ctx: &mut ServiceContext) -> Result<()> {
        self.beats += 1;
        debug!(
            "Heartbeat #{} ({} ms since previous cycle)",
            self.beats,
            time_ms() - ctx.last_loop_timestamp_ms
        );
        Ok(())
    }

    async fn execute_cmd(&mut self, ctx: &mut ServiceContext, cmd: &Command) -> Result<bool> {
        match cmd.name.as_str() {
            "ping" => {
                self.pings += 1;
                info!("pong from {} after {} beats", ctx.worker_name(), self.beats);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cleanup(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        info!("Heartbeat worker stopped after {} beats", self.beats);
        Ok(())
    }
}
