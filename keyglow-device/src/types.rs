//! Common device types

/// Identification and geometry of a lighting device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Backend-specific identifier (OpenRazer serial)
    pub serial: String,
    /// Human-readable product name
    pub name: String,
    /// USB Vendor ID
    pub vid: u16,
    /// USB Product ID
    pub pid: u16,
    /// LED matrix rows
    pub rows: usize,
    /// LED matrix columns
    pub cols: usize,
}

impl DeviceInfo {
    /// `VVVV:PPPP` as printed by lsusb
    pub fn vid_pid(&self) -> String {
        format!("{:04X}:{:04X}", self.vid, self.pid)
    }

    /// Whether this device is in the supported keyboard table
    pub fn is_supported(&self) -> bool {
        crate::device_registry::is_supported(self.vid, self.pid)
    }
}
