//! `keyglow devices`

use keyglow_device::OpenRazerDiscovery;

use super::CommandResult;

/// List OpenRazer devices with their matrix size and support status.
pub async fn devices() -> CommandResult {
    let discovery = OpenRazerDiscovery::connect().await?;
    let devices = discovery.list_devices().await?;

    if devices.is_empty() {
        println!("No OpenRazer devices found.");
        return Ok(());
    }

    println!(
        "{:<16} {:<10} {:<7} {:<11} Name",
        "Serial", "VID:PID", "Matrix", "Status"
    );
    for dev in &devices {
        let matrix = if dev.rows > 0 && dev.cols > 0 {
            format!("{}x{}", dev.rows, dev.cols)
        } else {
            "-".to_string()
        };
        let status = if dev.is_supported() {
            "supported"
        } else {
            "unsupported"
        };
        println!(
            "{:<16} {:<10} {:<7} {:<11} {}",
            dev.serial,
            dev.vid_pid(),
            matrix,
            status,
            dev.name
        );
    }
    Ok(())
}
