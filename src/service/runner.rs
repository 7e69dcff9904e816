//! Service main loop
//!
//! Startup, cycle and stop sequence shared by every backend:
//!
//! 1. publish the initial state, `initialize`, publish `running=1`, `READY=1`
//! 2. each cycle: drain commands, stop on exit, `process_tasks`, `do_job`,
//!    sleep `delay` seconds (a shutdown signal cuts the sleep short)
//! 3. publish `running=0`, `cleanup`, release the backend

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::config::{ServiceConfig, WorkerConfig};
use crate::errors::Result;
use crate::logging::{LevelHandle, LogLevel};
use crate::system::platform::{self, PidFileGuard};
use crate::system::{ShutdownSignal, listen_for_shutdown};

use super::backend::{NullBackend, RedisBackend, ServiceBackend};
use super::command::{CMD_DELAY, CMD_EXIT, CMD_LOGGING_LEVEL};
use super::{Command, ServiceContext, Worker, time_ms};

const DEFAULT_STOP_TIMEOUT_SECS: u64 = 30;

/// A worker driven by a backend
pub struct Service<W: Worker, B: ServiceBackend> {
    worker: W,
    backend: B,
    ctx: ServiceContext,
    shutdown: Option<ShutdownSignal>,
    pid_file: Option<PathBuf>,
    stop_timeout: Duration,
}

/// Service without external communication
pub type BasicService<W> = Service<W, NullBackend>;

/// Service controlled over Redis pub/sub
pub type RedisService<W> = Service<W, RedisBackend>;

impl<W: Worker> Service<W, NullBackend> {
    pub fn basic(worker: W, config: &ServiceConfig) -> Result<Self> {
        Self::new(worker, NullBackend, config)
    }
}

impl<W: Worker> Service<W, RedisBackend> {
    /// Connect the Redis backend and build the service from `config`
    pub async fn redis(worker: W, config: &WorkerConfig) -> Result<Self> {
        let backend = RedisBackend::connect(&config.redis, &config.service.name).await?;
        Self::from_config(worker, backend, config)
    }
}

impl<W: Worker, B: ServiceBackend> Service<W, B> {
    /// # Errors
    /// Returns a validation error when the configured delay is negative.
    pub fn new(worker: W, backend: B, config: &ServiceConfig) -> Result<Self> {
        Ok(Self {
            worker,
            backend,
            ctx: ServiceContext::new(config)?,
            shutdown: None,
            pid_file: None,
            stop_timeout: Duration::from_secs(DEFAULT_STOP_TIMEOUT_SECS),
        })
    }

    /// Build from the full configuration, including the PID file and stop timeout
    pub fn from_config(worker: W, backend: B, config: &WorkerConfig) -> Result<Self> {
        Ok(Self::new(worker, backend, &config.service)?
            .with_pid_file(config.system.pid_file.as_ref().map(PathBuf::from))
            .with_stop_timeout(Duration::from_secs(config.system.shutdown_timeout_secs)))
    }

    /// Use `signal` instead of listening for SIGTERM / SIGINT
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = Some(signal);
        self
    }

    /// Let `logging_level` changes reach the installed subscriber
    pub fn with_level_handle(mut self, handle: LevelHandle) -> Self {
        self.ctx = self.ctx.with_level_handle(handle);
        self
    }

    pub fn with_pid_file(mut self, path: Option<PathBuf>) -> Self {
        self.pid_file = path;
        self
    }

    /// Upper bound for the worker's `cleanup`
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run until exit is requested or a shutdown signal arrives.
    ///
    /// Returns the worker after a normal stop. Startup failures (PID file,
    /// backend, `initialize`) are returned as errors once the stop sequence
    /// has run.
    pub async fn run(mut self) -> Result<W> {
        let _pid_guard = self
            .pid_file
            .as_deref()
            .map(|path| PidFileGuard::acquire(path))
            .transpose()?;
        let mut shutdown = self.shutdown.take().unwrap_or_else(listen_for_shutdown);

        info!(
            "Starting {} v{} (worker {}, {} backend, delay {}s)",
            self.ctx.service_name(),
            self.ctx.version(),
            self.ctx.worker_id(),
            self.backend.name(),
            self.ctx.delay()
        );

        let started = self.start().await;
        match &started {
            Ok(()) => {
                self.notify("READY=1");
                self.main_loop(&mut shutdown).await;
            }
            Err(e) => error!("Service failed to start: {}", e),
        }

        self.stop().await;
        started.map(|()| self.worker)
    }

    async fn start(&mut self) -> Result<()> {
        self.backend.on_start(&self.ctx.state()).await?;
        self.worker.initialize(&mut self.ctx).await?;
        self.ctx.set_running(true);
        self.ctx.take_state_change();
        self.backend.on_state_change(&self.ctx.state()).await
    }

    async fn main_loop(&mut self, shutdown: &mut ShutdownSignal) {
        loop {
            let cycle_start = time_ms();

            self.process_messages().await;
            if self.ctx.exit_requested() {
                debug!("Exit requested");
                break;
            }

            if let Err(e) = self.worker.process_tasks(&mut self.ctx).await {
                error!("Task processing failed: {}", e);
            }
            if let Err(e) = self.worker.do_job(&mut self.ctx).await {
                error!("Job failed: {}", e);
            }
            self.sync_state().await;

            if self.ctx.exit_requested() || shutdown.is_triggered() {
                break;
            }

            let delay = self.ctx.delay_duration();
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.wait() => break,
            }
            self.ctx.last_loop_timestamp_ms = cycle_start;
        }
    }

    async fn process_messages(&mut self) {
        let commands = match self.backend.poll_commands().await {
            Ok(commands) => commands,
            Err(e) => {
                error!("Failed to receive commands: {}", e);
                return;
            }
        };
        for command in commands {
            self.dispatch(command).await;
        }
        self.sync_state().await;
    }

    async fn dispatch(&mut self, command: Command) {
        debug!("CMD: {}", command.name);
        debug!("PAR: {:?}", command.params);

        match (command.name.as_str(), command.param(0)) {
            (CMD_EXIT, _) => self.ctx.request_exit(),
            (CMD_DELAY, Some(value)) => match value.trim().parse::<f64>() {
                Ok(delay) => {
                    if let Err(e) = self.ctx.set_delay(delay) {
                        error!("{}", e.message());
                    }
                }
                Err(_) => warn!("Wrong argument for delay received"),
            },
            (CMD_LOGGING_LEVEL, Some(level)) => {
                self.ctx.set_logging_level(LogLevel::parse_lenient(level));
            }
            _ => match self.worker.execute_cmd(&mut self.ctx, &command).await {
                Ok(true) => {}
                Ok(false) => warn!("Command {} can not be executed", command.name),
                Err(e) => error!("Command {} failed: {}", command.name, e),
            },
        }
    }

    async fn sync_state(&mut self) {
        if !self.ctx.take_state_change() {
            return;
        }
        if let Err(e) = self.backend.on_state_change(&self.ctx.state()).await {
            warn!("Failed to publish service state: {}", e);
        }
    }

    async fn stop(&mut self) {
        self.notify("STOPPING=1");
        self.ctx.set_running(false);
        if let Err(e) = self.backend.on_state_change(&self.ctx.state()).await {
            warn!("Failed to publish service state: {}", e);
        }

        info!("Cleaning up...");
        match tokio::time::timeout(self.stop_timeout, self.worker.cleanup(&mut self.ctx)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Cleanup failed: {}", e),
            Err(_) => error!(
                "Cleanup timed out after {} seconds",
                self.stop_timeout.as_secs()
            ),
        }

        if let Err(e) = self.backend.on_stop().await {
            warn!("Failed to release {} backend: {}", self.backend.name(), e);
        }
        info!("{} stopped", self.ctx.service_name());
    }

    fn notify(&self, state: &str) {
        if let Err(e) = platform::notify_service_manager(state) {
            warn!("{}", e);
        }
    }
}
