//! nts-service - micro service workers for background operation
//!
//! A worker implements a handful of hooks ([`service::Worker`]); the
//! service runs them in a loop, listens for control commands and stops
//! gracefully on SIGTERM / SIGINT. The Redis flavour is controlled over a
//! pub/sub channel named after the service, publishes its state into a hash
//! of the same name, ships its logs into a Redis stream and offers
//! RedisTimeSeries helpers.
//!
//! # Architecture
//! - `service`: worker trait, service loop, backends (basic, memory, Redis)
//! - `broker`: Redis connection, status hash, pub/sub, time series, retry
//! - `logging`: log levels, console format, Redis stream sink
//! - `config`: TOML + environment configuration
//! - `system`: signals, PID file, service manager notification, panics
//! - `cli` / `interfaces` / `runtime`: the `nts-service` binary

pub mod broker;
pub mod cli;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod logging;
pub mod runtime;
pub mod service;
pub mod system;
