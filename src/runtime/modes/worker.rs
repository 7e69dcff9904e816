//! Worker mode
//!
//! Installs logging (console / file, plus the Redis log stream for the
//! Redis backend), then runs the heartbeat worker until it is told to stop.

use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use crate::broker;
use crate::cli::BackendKind;
use crate::config::WorkerConfig;
use crate::logging::{LogIdentity, RedisStreamLayer, init_logging};
use crate::runtime::HeartbeatWorker;
use crate::service::{NullBackend, RedisService, Service};
use crate::system::platform;

/// Upper bound for shipping the last log records to Redis
const LOG_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

pub async fn run_worker(config: WorkerConfig, backend: BackendKind) -> anyhow::Result<()> {
    let identity = LogIdentity {
        service_name: config.service.name.clone(),
        worker_id: config.service.worker_id,
    };
    let level = config.service.log_level();

    match backend {
        BackendKind::Basic => {
            let logging = init_logging(&config.logging, &identity, level, None)?;
            info!("Platform: {}", platform::platform_name());

            Service::from_config(HeartbeatWorker::new(), NullBackend, &config)?
                .with_level_handle(logging.level_handle())
                .run()
                .await?;
        }
        BackendKind::Redis => {
            let stream = if config.redis.stream_logs {
                let client = broker::open_client(&config.redis)?;
                Some(RedisStreamLayer::spawn(
                    client,
                    config.redis.log_stream.clone(),
                    config.service.name.clone(),
                ))
            } else {
                None
            };
            let logging = init_logging(&config.logging, &identity, level, stream)?;
            info!("Platform: {}", platform::platform_name());

            let result = RedisService::redis(HeartbeatWorker::new(), &config)
                .await
                .context("Failed to start Redis backend")?
                .with_level_handle(logging.level_handle())
                .run()
                .await;

            if !logging.flush(LOG_FLUSH_TIMEOUT).await {
                warn!("Log stream flush timed out");
            }
            result?;
        }
    }
    Ok(())
}
