//! Device error types

use thiserror::Error;

/// Errors from lighting device operations
#[derive(Error, Debug)]
pub enum DeviceError {
    /// No supported keyboard was found
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Cell outside the device grid
    #[error("Cell ({row}, {col}) outside {rows}x{cols} grid")]
    OutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// D-Bus transport error (OpenRazer daemon unreachable, method failed, ...)
    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    /// Device returned data we could not interpret
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Device refused a frame
    #[error("Write failed: {0}")]
    WriteFailed(String),
}
