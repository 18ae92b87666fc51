//! Command handlers for the CLI application.
//!
//! - `run`: the lighting daemon
//! - `devices`: OpenRazer device listing
//! - `check`: config diagnostics
//! - `preview`: terminal rendering without a device
//! - `off`: blank the keyboard

pub mod check;
pub mod devices;
pub mod off;
pub mod preview;
pub mod run;

use anyhow::Context;
use keyglow_device::{OpenRazerDiscovery, OpenRazerKeyboard};

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Connect to OpenRazer and open the first supported keyboard.
pub async fn open_keyboard() -> anyhow::Result<OpenRazerKeyboard> {
    let discovery = OpenRazerDiscovery::connect()
        .await
        .context("Failed to connect to the session D-Bus (is openrazer-daemon running?)")?;
    Ok(discovery.open_preferred().await?)
}
