//! Background service
//!
//! A [`Service`] drives a user [`Worker`] through a [`ServiceBackend`].
//! [`BasicService`] runs standalone; [`RedisService`] is controlled over a
//! Redis pub/sub channel and publishes its state into a Redis hash.
//!
//! ```no_run
//! use async_trait::async_trait;
//! use nts_service::config::ServiceConfig;
//! use nts_service::errors::Result;
//! use nts_service::service::{BasicService, ServiceContext, Worker};
//!
//! struct Counter(u32);
//!
//! #[async_trait]
//! impl Worker for Counter {
//!     async fn do_job(&mut self, ctx: &mut ServiceContext) -> Result<()> {
//!         self.0 += 1;
//!         if self.0 == 10 {
//!             ctx.request_exit();
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<()> {
//! let service = BasicService::basic(Counter(0), &ServiceConfig::default())?;
//! let worker = service.run().await?;
//! assert_eq!(worker.0, 10);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod command;
mod context;
mod runner;
mod worker;

pub use backend::{MemoryBackend, MemoryHandle, NullBackend, RedisBackend, ServiceBackend};
pub use command::{CMD_DELAY, CMD_EXIT, CMD_LOGGING_LEVEL, Command, SEPARATOR};
pub use context::{ServiceContext, ServiceState, time_ms};
pub use runner::{BasicService, RedisService, Service};
pub use worker::Worker;
