//! System-level modules
//!
//! - Signal handling (graceful shutdown on SIGTERM / SIGINT)
//! - Platform abstraction (PID file, service manager notification)
//! - Panic reporting

pub mod panic_handler;
pub mod platform;
pub mod signal;

pub use signal::{
    ShutdownReason, ShutdownSignal, ShutdownTrigger, listen_for_shutdown, shutdown_channel,
};
