//! Mode routing
//!
//! - Worker mode (`run`): long-running service
//! - CLI mode: one-shot operator commands

pub mod cli;
pub mod worker;

pub use cli::run_cli;
pub use worker::run_worker;

use crate::cli::Commands;
use crate::system::panic_handler::RunMode;

/// Which mode a parsed command runs in
pub fn detect_mode(command: &Commands) -> RunMode {
    match command {
        Commands::Run { .. } => RunMode::Worker,
        _ => RunMode::Cli,
    }
}
