use async_trait::async_trait;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::broker::{self, CommandSubscription, StatusHash, TimeSeries};
use crate::config::RedisConfig;
use crate::errors::Result;
use crate::service::{Command, ServiceState};

use super::ServiceBackend;

/// Backend of the Redis service.
///
/// Commands arrive on the pub/sub channel named after the service and the
/// state is written into the hash of the same name.
pub struct RedisBackend {
    client: redis::Client,
    conn: ConnectionManager,
    status: StatusHash,
    subscription: CommandSubscription,
    time_series: TimeSeries,
}

impl RedisBackend {
    /// Connect, subscribe to the command channel and load the time series labels
    pub async fn connect(config: &RedisConfig, service_name: &str) -> Result<Self> {
        let (client, conn) = broker::connect(config).await?;
        let subscription = CommandSubscription::subscribe(&client, service_name).await?;
        let time_series = TimeSeries::new(service_name, conn.clone());
        if let Err(e) = time_series.refresh_labels().await {
            warn!("Time series labels unavailable: {}", e);
        }

        Ok(Self {
            status: StatusHash::new(service_name, conn.clone()),
            client,
            conn,
            subscription,
            time_series,
        })
    }

    /// Time series helpers bound to this service
    pub fn time_series(&self) -> TimeSeries {
        self.time_series.clone()
    }

    /// Managed connection for worker-specific commands
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }

    pub fn client(&self) -> &redis::Client {
        &self.client
    }
}

#[async_trait]
impl ServiceBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn on_start(&mut self, state: &ServiceState) -> Result<()> {
        self.status.publish(state).await
    }

    async fn poll_commands(&mut self) -> Result<Vec<Command>> {
        Ok(self.subscription.drain())
    }

    async fn on_state_change(&mut self, state: &ServiceState) -> Result<()> {
        self.status.publish(state).await
    }

    async fn on_stop(&mut self) -> Result<()> {
        self.subscription.close();
        debug!(
            "Unsubscribed from '{}', status kept in '{}'",
            self.subscription.channel(),
            self.status.key()
        );
        Ok(())
    }
}
