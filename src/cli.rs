// CLI definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "keyglow")]
#[command(author, version, about = "Mode-aware per-key lighting for OpenRazer keyboards")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.config/keyglow/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config `log` switch
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the lighting daemon (default)
    #[command(visible_alias = "r")]
    Run,

    /// List OpenRazer devices and whether keyglow supports them
    #[command(visible_aliases = ["list", "ls"])]
    Devices,

    /// Load the config and print modes, key groups and palette
    Check,

    /// Render a mode in the terminal without a device
    #[command(visible_alias = "p")]
    Preview {
        /// Held keys, in press order (e.g. super,q)
        #[arg(long, value_delimiter = ',')]
        keys: Vec<String>,
        /// Render this mode directly instead of resolving from --keys
        #[arg(long)]
        mode: Option<String>,
        /// Occupied workspace labels (e.g. 1,3)
        #[arg(long, value_delimiter = ',')]
        workspaces: Option<Vec<String>>,
        /// Grid rows
        #[arg(long, default_value = "6")]
        rows: usize,
        /// Grid columns
        #[arg(long, default_value = "22")]
        cols: usize,
    },

    /// Turn all keys off
    Off,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_preview_args() {
        let cli = Cli::parse_from([
            "keyglow",
            "--config",
            "/tmp/k.toml",
            "preview",
            "--keys",
            "super,q",
            "--workspaces",
            "1,3",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
        match cli.command {
            Some(Commands::Preview {
                keys,
                workspaces,
                rows,
                cols,
                mode,
            }) => {
                assert_eq!(keys, ["super", "q"]);
                assert_eq!(workspaces, Some(vec!["1".to_string(), "3".to_string()]));
                assert_eq!((rows, cols), (6, 22));
                assert!(mode.is_none());
            }
            _ => panic!("expected preview"),
        }
    }

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["keyglow", "--log-level", "debug"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
