//! Service status hash
//!
//! Each service owns a hash named after itself holding `version`, `delay`,
//! `logging_level` and `running`, so operators (and `nts-service status`)
//! can inspect a live worker.

use std::collections::HashMap;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::trace;

use crate::errors::Result;
use crate::service::ServiceState;

pub struct StatusHash {
    key: String,
    conn: ConnectionManager,
}

impl StatusHash {
    pub fn new(key: impl Into<String>, conn: ConnectionManager) -> Self {
        Self {
            key: key.into(),
            conn,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write every status field
    pub async fn publish(&mut self, state: &ServiceState) -> Result<()> {
        let fields = state.fields();
        trace!("HSET {} {:?}", self.key, fields);
        let _: () = self.conn.hset_multiple(&self.key, &fields).await?;
        Ok(())
    }
}

/// Read a status hash (used by the CLI)
pub async fn read_status(
    conn: &mut ConnectionManager,
    service: &str,
) -> Result<HashMap<String, String>> {
    let fields: HashMap<String, String> = conn.hgetall(service).await?;
    Ok(fields)
}
