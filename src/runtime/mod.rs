//! Application entry points
//!
//! - `modes`: worker mode (`run`) and operator CLI mode
//! - `heartbeat`: the worker bundled with the binary

pub mod heartbeat;
pub mod modes;

pub use heartbeat::HeartbeatWorker;
