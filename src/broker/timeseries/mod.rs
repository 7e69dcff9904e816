//! RedisTimeSeries helpers
//!
//! Source series are tagged `name=<service> type=src`; every aggregation
//! creates one compacted series per function in [`AGGREGATION_FUNCTIONS`],
//! named `<label>_<fun>_<seconds>s`, fed by a `TS.CREATERULE` rule.

mod info;

use std::sync::Arc;

use parking_lot::RwLock;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use crate::errors::Result;

pub use info::{TimeSeriesInfo, TimeSeriesRule};

/// 30 days
pub const DEFAULT_RETENTION_SECS: u64 = 2_592_000;
pub const DEFAULT_AGGREGATION_SECS: u64 = 10;
pub const AGGREGATION_FUNCTIONS: [&str; 2] = ["avg", "std.s"];

/// Name of the compacted series for `label`
pub fn aggregation_key(label: &str, fun: &str, aggregation_secs: u64) -> String {
    format!("{}_{}_{}s", label, fun, aggregation_secs)
}

/// Compacted series keep `retention * max(1, aggregation)` of history
pub fn aggregation_retention_ms(retention_secs: u64, aggregation_secs: u64) -> u64 {
    retention_secs
        .saturating_mul(1000)
        .saturating_mul(aggregation_secs.max(1))
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Server-side rejection (key exists, rule exists, ...) as opposed to I/O
fn is_response_error(err: &redis::RedisError) -> bool {
    err.code().is_some()
}

/// Time series handle of one service; clones share the label cache
#[derive(Clone)]
pub struct TimeSeries {
    service_name: Arc<str>,
    conn: ConnectionManager,
    labels: Arc<RwLock<Vec<String>>>,
}

impl TimeSeries {
    pub fn new(service_name: &str, conn: ConnectionManager) -> Self {
        Self {
            service_name: Arc::from(service_name),
            conn,
            labels: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Source series owned by this service, as of the last refresh
    pub fn ts_labels(&self) -> Vec<String> {
        self.labels.read().clone()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.read().iter().any(|l| l == label)
    }

    /// Reload the label cache with `TS.QUERYINDEX name=<service> type=src`
    pub async fn refresh_labels(&self) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let labels: Vec<String> = redis::cmd("TS.QUERYINDEX")
            .arg(format!("name={}", self.service_name))
            .arg("type=src")
            .query_async(&mut conn)
            .await?;
        debug!("Time series labels of {}: {:?}", self.service_name, labels);
        *self.labels.write() = labels.clone();
        Ok(labels)
    }

    /// Create a source series; an existing series is left untouched.
    ///
    /// Each entry of `aggregations_secs` adds compacted series through
    /// [`TimeSeries::add_time_series_aggregation`].
    pub async fn create_time_series_channel(
        &self,
        label: &str,
        retention_secs: u64,
        aggregations_secs: &[u64],
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let created: redis::RedisResult<()> = redis::cmd("TS.CREATE")
            .arg(label)
            .arg("RETENTION")
            .arg(retention_secs.saturating_mul(1000))
            .arg("LABELS")
            .arg("name")
            .arg(&*self.service_name)
            .arg("type")
            .arg("src")
            .query_async(&mut conn)
            .await;
        match created {
            Ok(()) => debug!("Time series '{}' created", label),
            Err(e) if is_response_error(&e) => debug!("TS.CREATE {} ignored: {}", label, e),
            Err(e) => return Err(e.into()),
        }

        self.refresh_labels().await?;
        for &aggregation in aggregations_secs {
            self.add_time_series_aggregation(label, aggregation, retention_secs)
                .await?;
        }
        Ok(())
    }

    /// Create `avg` and `std.s` compactions of `label` over `aggregation_secs` buckets.
    ///
    /// Only applies to known labels. Server rejections (already existing
    /// series or rules) stop the remaining steps silently.
    pub async fn add_time_series_aggregation(
        &self,
        label: &str,
        aggregation_secs: u64,
        retention_secs: u64,
    ) -> Result<()> {
        if !self.has_label(label) {
            warn!("Time series '{}' is unknown, aggregation skipped", label);
            return Ok(());
        }

        match self
            .create_aggregations(label, aggregation_secs, retention_secs)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_response_error(&e) => {
                debug!("Aggregation of '{}' ignored: {}", label, e);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_aggregations(
        &self,
        label: &str,
        aggregation_secs: u64,
        retention_secs: u64,
    ) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        let retention_ms = aggregation_retention_ms(retention_secs, aggregation_secs);
        let bucket_ms = aggregation_secs.saturating_mul(1000);

        for fun in AGGREGATION_FUNCTIONS {
            let key = aggregation_key(label, fun, aggregation_secs);
            redis::cmd("TS.CREATE")
                .arg(&key)
                .arg("RETENTION")
                .arg(retention_ms)
                .arg("LABELS")
                .arg("name")
                .arg(&*self.service_name)
                .arg("type")
                .arg(fun)
                .query_async::<()>(&mut conn)
                .await?;
            redis::cmd("TS.CREATERULE")
                .arg(label)
                .arg(&key)
                .arg("AGGREGATION")
                .arg(fun)
                .arg(bucket_ms)
                .query_async::<()>(&mut conn)
                .await?;
            debug!("Aggregation '{}' of '{}' created", key, label);
        }
        Ok(())
    }

    /// Delete the compacted series of one aggregation period
    pub async fn del_time_series_aggregation(
        &self,
        label: &str,
        aggregation_secs: u64,
    ) -> Result<()> {
        if !self.has_label(label) {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        for fun in AGGREGATION_FUNCTIONS {
            let key = aggregation_key(label, fun, aggregation_secs);
            let _: i64 = conn.del(&key).await?;
        }
        Ok(())
    }

    /// Delete a source series together with every rule destination
    pub async fn del_time_series_channel(&self, label: &str) -> Result<()> {
        if !self.has_label(label) {
            return Ok(());
        }
        let info = self.info(label).await?;
        let mut conn = self.conn.clone();
        for destination in info.rule_destinations() {
            let _: i64 = conn.del(destination).await?;
        }
        let _: i64 = conn.del(label).await?;
        debug!("Time series '{}' deleted", label);

        self.refresh_labels().await?;
        Ok(())
    }

    /// Append a sample; `timestamp_ms` defaults to now
    pub async fn put_ts_data(
        &self,
        label: &str,
        value: f64,
        timestamp_ms: Option<i64>,
    ) -> Result<i64> {
        let mut conn = self.conn.clone();
        let timestamp: i64 = redis::cmd("TS.ADD")
            .arg(label)
            .arg(timestamp_ms.unwrap_or_else(now_ms))
            .arg(value)
            .arg("LABELS")
            .arg("name")
            .arg(&*self.service_name)
            .arg("type")
            .arg("src")
            .query_async(&mut conn)
            .await?;
        Ok(timestamp)
    }

    pub async fn info(&self, label: &str) -> Result<TimeSeriesInfo> {
        let mut conn = self.conn.clone();
        let reply: redis::Value = redis::cmd("TS.INFO")
            .arg(label)
            .query_async(&mut conn)
            .await?;
        TimeSeriesInfo::from_value(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregation_key() {
        assert_eq!(aggregation_key("cpu", "avg", 60), "cpu_avg_60s");
        assert_eq!(aggregation_key("cpu", "std.s", 1), "cpu_std.s_1s");
    }

    #[test]
    fn test_aggregation_retention() {
        assert_eq!(aggregation_retention_ms(2000, 60), 120_000_000);
        assert_eq!(aggregation_retention_ms(2000, 0), 2_000_000);
        assert_eq!(
            aggregation_retention_ms(DEFAULT_RETENTION_SECS, 1),
            2_592_000_000
        );
    }

    #[test]
    fn test_now_ms_is_recent() {
        let now = now_ms();
        assert!(now > 1_600_000_000_000);
    }
}
