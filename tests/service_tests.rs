//! Service loop tests driven through the in-memory backend

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use nts_service::config::ServiceConfig;
use nts_service::errors::{Result, ServiceError};
use nts_service::logging::LogLevel;
use nts_service::service::{
    BasicService, Command, MemoryBackend, Service, ServiceContext, Worker,
};
use nts_service::system::{ShutdownReason, ShutdownSignal, shutdown_channel};

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

fn config(delay: f64) -> ServiceConfig {
    ServiceConfig {
        name: "TestWorker".to_string(),
        version: "1.0.1".to_string(),
        delay,
        worker_id: 1,
        logging_level: "DEBUG".to_string(),
    }
}

/// Counts jobs and requests exit once `max_count` is reached
#[derive(Default)]
struct CountingWorker {
    count: u32,
    max_count: u32,
    initialized: bool,
    cleaned_up: bool,
    unknown: Vec<Command>,
    seen_delays: Vec<f64>,
    seen_levels: Vec<LogLevel>,
    loop_timestamps: Vec<i64>,
}

impl CountingWorker {
    fn new(max_count: u32) -> Self {
        Self {
            max_count,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Worker for CountingWorker {
    async fn initialize(&mut self, ctx: &mut ServiceContext) -> Result<()> {
        assert!(!ctx.is_running());
        self.initialized = true;
        Ok(())
    }

    async fn do_job(&mut self, ctx: &mut ServiceContext) -> Result<()> {
        assert!(ctx.is_running());
        self.count += 1;
        self.seen_delays.push(ctx.delay());
        self.seen_levels.push(ctx.logging_level());
        self.loop_timestamps.push(ctx.last_loop_timestamp_ms);
        if self.count >= self.max_count {
            ctx.request_exit();
        }
        Ok(())
    }

    async fn execute_cmd(&mut self, _ctx: &mut ServiceContext, cmd: &Command) -> Result<bool> {
        self.unknown.push(cmd.clone());
        Ok(cmd.name == "known")
    }

    async fn cleanup(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
        self.cleaned_up = true;
        Ok(())
    }
}

async fn run_with_timeout<W: Worker, B: nts_service::service::ServiceBackend>(
    service: Service<W, B>,
) -> Result<W> {
    tokio::time::timeout(TEST_TIMEOUT, service.run())
        .await
        .expect("service did not stop in time")
}

#[cfg(test)]
mod basic_service_tests {
    use super::*;

    #[tokio::test]
    async fn test_worker_requested_exit_stops_loop() {
        let service = BasicService::basic(CountingWorker::new(12), &config(0.0))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());

        let worker = run_with_timeout(service).await.unwrap();

        assert!(worker.initialized);
        assert!(worker.cleaned_up);
        assert_eq!(worker.count, 12);
    }

    #[tokio::test]
    async fn test_loop_timestamp_tracks_previous_cycle() {
        let service = BasicService::basic(CountingWorker::new(4), &config(0.005))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());

        let worker = run_with_timeout(service).await.unwrap();

        let stamps = &worker.loop_timestamps;
        assert_eq!(stamps.len(), 4);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        assert!(stamps[1] < stamps[3]);
    }

    #[tokio::test]
    async fn test_negative_delay_rejected_at_construction() {
        let result = BasicService::basic(CountingWorker::new(1), &config(-1.0));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn test_shutdown_signal_interrupts_sleep() {
        let (trigger, signal) = shutdown_channel();
        let service = BasicService::basic(CountingWorker::new(u32::MAX), &config(60.0))
            .unwrap()
            .with_shutdown(signal);

        let handle = tokio::spawn(service.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger(ShutdownReason::Terminate);

        let worker = tokio::time::timeout(TEST_TIMEOUT, handle)
            .await
            .expect("service did not stop in time")
            .unwrap()
            .unwrap();
        assert_eq!(worker.count, 1);
        assert!(worker.cleaned_up);
    }

    #[tokio::test]
    async fn test_pid_file_held_while_running() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("worker.pid");

        let service = BasicService::basic(CountingWorker::new(1), &config(0.0))
            .unwrap()
            .with_shutdown(ShutdownSignal::never())
            .with_pid_file(Some(pid_path.clone()));

        run_with_timeout(service).await.unwrap();
        assert!(!pid_path.exists());
    }

    #[tokio::test]
    async fn test_pid_file_exists_during_run() {
        let dir = tempfile::tempdir().unwrap();
        let pid_path = dir.path().join("worker.pid");
        let (backend, handle) = MemoryBackend::new();

        let service = Service::new(CountingWorker::new(u32::MAX), backend, &config(0.01))
            .unwrap()
            .with_shutdown(ShutdownSignal::never())
            .with_pid_file(Some(pid_path.clone()));
        let task = tokio::spawn(service.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let content = std::fs::read_to_string(&pid_path).unwrap();
        assert_eq!(content, std::process::id().to_string());

        handle.send("exit").unwrap();
        tokio::time::timeout(TEST_TIMEOUT, task)
            .await
            .expect("service did not stop in time")
            .unwrap()
            .unwrap();
        assert!(!pid_path.exists());
    }
}

#[cfg(test)]
mod command_tests {
    use super::*;

    #[tokio::test]
    async fn test_builtin_and_unknown_commands() {
        let (backend, handle) = MemoryBackend::new();
        for payload in [
            "my_command",
            " ",
            "known::a::b",
            "delay::0.02",
            "delay::aaa",
            "delay::-1",
            "delay",
            "logging_level::WRN",
        ] {
            handle.send(payload).unwrap();
        }

        let service = Service::new(CountingWorker::new(1), backend, &config(0.5))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());
        let worker = run_with_timeout(service).await.unwrap();

        let names: Vec<_> = worker.unknown.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["my_command", "", "known", "delay"]);
        assert_eq!(worker.unknown[2].params, vec!["a", "b"]);

        assert_eq!(worker.seen_delays, vec![0.02]);
        assert_eq!(worker.seen_levels, vec![LogLevel::Warning]);

        assert_eq!(handle.status_field("delay").as_deref(), Some("0.02"));
        assert_eq!(handle.status_field("logging_level").as_deref(), Some("30"));
        assert_eq!(handle.status_field("version").as_deref(), Some("1.0.1"));
    }

    #[tokio::test]
    async fn test_oversized_delay_keeps_previous_value() {
        let (backend, handle) = MemoryBackend::new();
        handle.send("delay::1e20").unwrap();

        let service = Service::new(CountingWorker::new(3), backend, &config(0.01))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());
        let worker = run_with_timeout(service).await.unwrap();

        assert_eq!(worker.count, 3);
        assert_eq!(worker.seen_delays, vec![0.01, 0.01, 0.01]);
        assert!(worker.unknown.is_empty());
        assert_eq!(handle.status_field("delay").as_deref(), Some("0.01"));
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_exit_command_skips_job() {
        let (backend, handle) = MemoryBackend::new();
        handle.send("exit").unwrap();

        let service = Service::new(CountingWorker::new(100), backend, &config(0.0))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());
        let worker = run_with_timeout(service).await.unwrap();

        assert_eq!(worker.count, 0);
        assert!(worker.initialized);
        assert!(worker.cleaned_up);
        assert!(handle.is_stopped());
        assert_eq!(handle.status_field("running").as_deref(), Some("0"));
    }

    #[tokio::test]
    async fn test_exit_sent_while_running() {
        let (backend, handle) = MemoryBackend::new();
        let service = Service::new(CountingWorker::new(u32::MAX), backend, &config(0.01))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());

        let task = tokio::spawn(service.run());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_started());
        assert_eq!(handle.status_field("running").as_deref(), Some("1"));
        handle.send("exit").unwrap();

        let worker = tokio::time::timeout(TEST_TIMEOUT, task)
            .await
            .expect("service did not stop in time")
            .unwrap()
            .unwrap();
        assert!(worker.count > 0);
        assert_eq!(handle.status_field("running").as_deref(), Some("0"));
    }
}

#[cfg(test)]
mod hook_error_tests {
    use super::*;

    struct FailingInit {
        cleaned_up: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Worker for FailingInit {
        async fn initialize(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
            Err(ServiceError::worker("no database"))
        }

        async fn do_job(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
            panic!("do_job must not run after a failed initialize");
        }

        async fn cleanup(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
            self.cleaned_up.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_initialize_error_aborts_startup() {
        let cleaned_up = Arc::new(AtomicBool::new(false));
        let (backend, handle) = MemoryBackend::new();
        let worker = FailingInit {
            cleaned_up: cleaned_up.clone(),
        };

        let service = Service::new(worker, backend, &config(0.0))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());
        let result = run_with_timeout(service).await;

        assert!(matches!(result, Err(ServiceError::Worker(_))));
        assert!(cleaned_up.load(Ordering::SeqCst));
        assert!(handle.is_stopped());
        assert_eq!(handle.status_field("running").as_deref(), Some("0"));
    }

    #[derive(Default)]
    struct FlakyJob {
        attempts: u32,
    }

    #[async_trait]
    impl Worker for FlakyJob {
        async fn process_tasks(&mut self, _ctx: &mut ServiceContext) -> Result<()> {
            Err(ServiceError::worker("queue unavailable"))
        }

        async fn do_job(&mut self, ctx: &mut ServiceContext) -> Result<()> {
            self.attempts += 1;
            if self.attempts == 3 {
                ctx.request_exit();
                return Ok(());
            }
            Err(ServiceError::worker("transient"))
        }
    }

    #[tokio::test]
    async fn test_job_errors_do_not_stop_loop() {
        let service = BasicService::basic(FlakyJob::default(), &config(0.0))
            .unwrap()
            .with_shutdown(ShutdownSignal::never());

        let worker = run_with_timeout(service).await.unwrap();
        assert_eq!(worker.attempts, 3);
    }
}
