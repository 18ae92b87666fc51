//! In-memory lighting device.
//!
//! Records every flushed frame. Clones share state, so a test can hand one
//! clone to the render task and inspect frames through another.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::DeviceError;
use crate::led::Rgb;
use crate::types::DeviceInfo;
use crate::{CellBuffer, LightingDevice};

#[derive(Debug)]
struct MemoryState {
    staged: CellBuffer,
    flushed: Vec<CellBuffer>,
    fail_flush: bool,
}

/// Device that keeps frames in memory
#[derive(Debug, Clone)]
pub struct MemoryDevice {
    info: DeviceInfo,
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryDevice {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            info: DeviceInfo {
                serial: "memory".to_string(),
                name: "In-memory keyboard".to_string(),
                vid: 0,
                pid: 0,
                rows,
                cols,
            },
            state: Arc::new(Mutex::new(MemoryState {
                staged: CellBuffer::new(rows, cols),
                flushed: Vec::new(),
                fail_flush: false,
            })),
        }
    }

    /// Make subsequent flushes fail (simulates a vanished device)
    pub fn set_fail_flush(&self, fail: bool) {
        self.state.lock().fail_flush = fail;
    }

    /// Number of successful flushes
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushed.len()
    }

    /// Most recently flushed frame
    pub fn last_frame(&self) -> Option<CellBuffer> {
        self.state.lock().flushed.last().cloned()
    }

    /// All flushed frames, oldest first
    pub fn frames(&self) -> Vec<CellBuffer> {
        self.state.lock().flushed.clone()
    }
}

#[async_trait]
impl LightingDevice for MemoryDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn set_cell(&mut self, row: usize, col: usize, color: Rgb) -> Result<(), DeviceError> {
        self.state.lock().staged.set(row, col, color)
    }

    async fn flush(&mut self) -> Result<(), DeviceError> {
        let mut state = self.state.lock();
        if state.fail_flush {
            return Err(DeviceError::WriteFailed("memory device offline".into()));
        }
        let frame = state.staged.clone();
        state.flushed.push(frame);
        Ok(())
    }
}
