//! Lighting device abstraction for keyglow
//!
//! The lighting engine only needs three things from hardware: the grid
//! size, a way to stage a color per cell, and a flush that pushes the staged
//! frame. Backends:
//!
//! - OpenRazer (session D-Bus, `org.razer`)
//! - In-memory (tests and dry runs)

pub mod device_registry;
pub mod error;
pub mod led;
pub mod memory;
pub mod openrazer;
pub mod types;

pub use device_registry::{is_supported, KEYBOARD_PIDS, VENDOR_ID};
pub use error::DeviceError;
pub use led::Rgb;
pub use memory::MemoryDevice;
pub use openrazer::{OpenRazerDiscovery, OpenRazerKeyboard};
pub use types::DeviceInfo;

use async_trait::async_trait;

/// The core device trait - all backends implement this
///
/// Cells are staged with [`LightingDevice::set_cell`] and become visible on
/// the next [`LightingDevice::flush`].
#[async_trait]
pub trait LightingDevice: Send {
    /// Get device information
    fn info(&self) -> &DeviceInfo;

    /// LED matrix size as `(rows, cols)`
    fn grid_dimensions(&self) -> (usize, usize) {
        let info = self.info();
        (info.rows, info.cols)
    }

    /// Stage a color for one cell
    fn set_cell(&mut self, row: usize, col: usize, color: Rgb) -> Result<(), DeviceError>;

    /// Push all staged cells to the hardware
    async fn flush(&mut self) -> Result<(), DeviceError>;

    /// Stage black on every cell and flush
    async fn clear(&mut self) -> Result<(), DeviceError> {
        let (rows, cols) = self.grid_dimensions();
        for row in 0..rows {
            for col in 0..cols {
                self.set_cell(row, col, Rgb::BLACK)?;
            }
        }
        self.flush().await
    }
}

/// Row-major cell buffer with bounds checking, shared by the backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellBuffer {
    rows: usize,
    cols: usize,
    cells: Vec<Rgb>,
}

impl CellBuffer {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Rgb::BLACK; rows * cols],
        }
    }

    pub fn set(&mut self, row: usize, col: usize, color: Rgb) -> Result<(), DeviceError> {
        if row >= self.rows || col >= self.cols {
            return Err(DeviceError::OutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }
        self.cells[row * self.cols + col] = color;
        Ok(())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Iterate rows as slices
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.cells.chunks(self.cols.max(1))
    }

    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_buffer_bounds() {
        let mut buf = CellBuffer::new(2, 3);
        assert!(buf.set(1, 2, Rgb::RED).is_ok());
        assert_eq!(buf.get(1, 2), Some(Rgb::RED));
        assert!(matches!(
            buf.set(2, 0, Rgb::RED),
            Err(DeviceError::OutOfRange { row: 2, col: 0, .. })
        ));
        assert_eq!(buf.get(0, 3), None);
    }

    #[test]
    fn test_cell_buffer_rows() {
        let mut buf = CellBuffer::new(2, 2);
        buf.set(1, 0, Rgb::BLUE).unwrap();
        let rows: Vec<&[Rgb]> = buf.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], &[Rgb::BLUE, Rgb::BLACK]);
    }
}
