//! `keyglow off`

use keyglow_device::LightingDevice;

use super::CommandResult;

/// Set every key to black.
pub async fn off() -> CommandResult {
    let mut keyboard = super::open_keyboard().await?;
    keyboard.clear().await?;
    println!("{}: all keys off", keyboard.info().name);
    Ok(())
}
