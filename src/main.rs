use anyhow::Context;
use clap::Parser;

use nts_service::cli::{Cli, Commands};
use nts_service::config::WorkerConfig;
use nts_service::runtime::modes;
use nts_service::system::panic_handler::install_panic_hook;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    install_panic_hook(modes::detect_mode(&cli.command));

    let config = WorkerConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run { backend } => modes::run_worker(config, backend).await,
        command => modes::run_cli(command, &config).await,
    }
}
