//! CLI mode
//!
//! Operator commands log warnings and errors to the console only; the
//! outcome is printed, and a failure exits with status 1.

use crate::cli::Commands;
use crate::config::WorkerConfig;
use crate::logging::{LogIdentity, LogLevel, init_logging};

pub async fn run_cli(command: Commands, config: &WorkerConfig) -> anyhow::Result<()> {
    let identity = LogIdentity {
        service_name: "nts-service".to_string(),
        worker_id: std::process::id(),
    };
    let _guard = init_logging(&Default::default(), &identity, LogLevel::Warning, None)?;

    if let Err(e) = crate::interfaces::cli::run_cli_command(command, config).await {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
    Ok(())
}
