//! Command-line interface definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// nts-service - background workers controlled over Redis
#[derive(Parser, Debug)]
#[command(name = "nts-service")]
#[command(version)]
#[command(about = "Micro service worker for background operation", long_about = None)]
pub struct Cli {
    /// Configuration file (default: nts-service.toml when present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the heartbeat worker until `exit` or SIGTERM / SIGINT
    Run {
        #[arg(long, value_enum, default_value_t = BackendKind::Redis)]
        backend: BackendKind,
    },

    /// Publish a command on a service channel
    ///
    /// Example: send collector delay 2.5  ->  "delay::2.5"
    Send {
        /// Service (channel) name
        service: String,

        /// Command name
        command: String,

        /// Command parameters
        params: Vec<String>,
    },

    /// Show the status hash of a service
    Status {
        service: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate a sample configuration file
    Generate {
        /// Output path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Pub/sub control channel and status hash
    Redis,
    /// No external communication
    Basic,
}
