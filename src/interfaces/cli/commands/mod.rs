//! CLI command implementations

mod config_gen;
mod send;
mod status;

pub use config_gen::config_generate;
pub use send::send_command;
pub use status::{render_status, service_status};
