//! Redis plumbing shared by the Redis backend and the CLI
//!
//! - connection URL / client construction from [`RedisConfig`]
//! - status hash, pub/sub command source, time series helpers
//! - retry of connection-class failures

pub mod pubsub;
pub mod retry;
pub mod status;
pub mod timeseries;

use redis::aio::ConnectionManager;
use tracing::{debug, info};

use crate::config::RedisConfig;
use crate::errors::{Result, ServiceError};

pub use pubsub::CommandSubscription;
pub use retry::{RetryConfig, is_retryable_error, with_retry};
pub use status::StatusHash;
pub use timeseries::{TimeSeries, TimeSeriesInfo, TimeSeriesRule};

/// `redis://[user[:password]@]host:port/db` with percent-encoded credentials
pub fn connection_url(config: &RedisConfig) -> String {
    build_url(config, config.password.as_deref().map(urlencoding::encode))
}

/// Same URL with the password masked, for logs
pub fn display_url(config: &RedisConfig) -> String {
    build_url(config, config.password.as_ref().map(|_| "***".into()))
}

fn build_url(config: &RedisConfig, password: Option<std::borrow::Cow<'_, str>>) -> String {
    let user = config.username.as_deref().map(urlencoding::encode);
    let credentials = match (user, password) {
        (Some(user), Some(pass)) => format!("{}:{}@", user, pass),
        (Some(user), None) => format!("{}@", user),
        (None, Some(pass)) => format!(":{}@", pass),
        (None, None) => String::new(),
    };
    format!(
        "redis://{}{}:{}/{}",
        credentials, config.host, config.port, config.db
    )
}

pub fn open_client(config: &RedisConfig) -> Result<redis::Client> {
    redis::Client::open(connection_url(config)).map_err(|e| {
        ServiceError::redis_connection(format!(
            "Invalid Redis address {}: {}",
            display_url(config),
            e
        ))
    })
}

/// Open a client and a managed connection, retrying while the server is unreachable
pub async fn connect(config: &RedisConfig) -> Result<(redis::Client, ConnectionManager)> {
    let client = open_client(config)?;
    debug!("Connecting to Redis at {}", display_url(config));

    let manager = with_retry("redis connect", RetryConfig::from(config), || {
        client.get_connection_manager()
    })
    .await
    .map_err(|e| {
        ServiceError::redis_connection(format!(
            "Failed to connect to Redis at {}: {}",
            display_url(config),
            e
        ))
    })?;

    info!("Connected to Redis at {}", display_url(config));
    Ok((client, manager))
}
