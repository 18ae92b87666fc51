//! keyglow CLI
//!
//! Lights a Razer keyboard according to held keys, the pywal palette and
//! i3/sway workspace occupancy.

use anyhow::Result;
use clap::Parser;

use keyglow::config::Config;
use keyglow::logging;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The config `log` switch is applied once the daemon has read the file
    let log = logging::init(cli.log_level.as_deref(), "info");
    let config_path = cli.config.unwrap_or_else(Config::default_path);

    match cli.command {
        None | Some(Commands::Run) => commands::run::run(config_path, log).await,
        Some(Commands::Devices) => commands::devices::devices().await,
        Some(Commands::Check) => commands::check::check(&config_path),
        Some(Commands::Preview {
            keys,
            mode,
            workspaces,
            rows,
            cols,
        }) => commands::preview::preview(
            &config_path,
            &keys,
            mode.as_deref(),
            workspaces.as_deref(),
            rows,
            cols,
        ),
        Some(Commands::Off) => commands::off::off().await,
    }
}
