//! Frame delivery to the device.
//!
//! Frames go through a `watch` channel to a single writer task. A slow
//! device write never queues stale frames: the writer always picks up the
//! newest one, and frames are never written out of order.

use keyglow_device::{DeviceError, LightingDevice};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::rules::Frame;

/// Stage every cell of `frame` and flush once.
///
/// Cells outside the device grid are skipped.
pub async fn write_frame<D: LightingDevice + ?Sized>(
    device: &mut D,
    frame: &Frame,
) -> Result<(), DeviceError> {
    let (rows, cols) = device.grid_dimensions();
    for (coord, color) in frame.iter() {
        if coord.in_grid(rows, cols) {
            device.set_cell(coord.row, coord.col, color)?;
        }
    }
    device.flush().await
}

/// Handle to the writer task
pub struct FrameSink<D> {
    tx: watch::Sender<Option<Frame>>,
    task: JoinHandle<D>,
}

impl<D: LightingDevice + 'static> FrameSink<D> {
    /// Move `device` into a writer task
    pub fn spawn(mut device: D) -> Self {
        let (tx, mut rx) = watch::channel(None::<Frame>);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let frame = rx.borrow_and_update().clone();
                let Some(frame) = frame else { continue };
                if let Err(e) = write_frame(&mut device, &frame).await {
                    warn!("LED write error: {e}");
                }
            }
            debug!("Frame channel closed, writer exiting");
            device
        });
        Self { tx, task }
    }

    /// Queue a frame, replacing any frame not yet written
    pub fn submit(&self, frame: Frame) {
        self.tx.send_replace(Some(frame));
    }

    /// Close the channel and wait for the writer. Pending frames are
    /// written first. Returns the device, or `None` if the writer panicked.
    pub async fn close(self) -> Option<D> {
        let Self { tx, task } = self;
        drop(tx);
        match task.await {
            Ok(device) => Some(device),
            Err(e) => {
                warn!("Frame writer task failed: {e}");
                None
            }
        }
    }
}

/// Write an all-black frame. Failures are logged and swallowed.
pub async fn blank<D: LightingDevice + ?Sized>(device: &mut D) {
    match device.clear().await {
        Ok(()) => debug!("Keyboard blanked"),
        Err(e) => warn!("Failed to blank keyboard: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positions::Coord;
    use keyglow_device::{MemoryDevice, Rgb};

    fn frame_with(rows: usize, cols: usize, color: Rgb) -> Frame {
        let mut f = Frame::new(rows, cols);
        f.set(Coord::new(0, 0), color);
        f
    }

    #[tokio::test]
    async fn test_write_frame() {
        let mut dev = MemoryDevice::new(2, 3);
        write_frame(&mut dev, &frame_with(2, 3, Rgb::RED)).await.unwrap();
        let last = dev.last_frame().unwrap();
        assert_eq!(last.get(0, 0), Some(Rgb::RED));
        assert_eq!(last.get(1, 2), Some(Rgb::BLACK));
        assert_eq!(dev.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_larger_frame_is_clipped() {
        let mut dev = MemoryDevice::new(1, 1);
        let mut f = Frame::new(3, 3);
        f.set(Coord::new(2, 2), Rgb::RED);
        write_frame(&mut dev, &f).await.unwrap();
        assert_eq!(dev.last_frame().unwrap().cells(), &[Rgb::BLACK]);
    }

    #[tokio::test]
    async fn test_sink_writes_latest_in_order() {
        let dev = MemoryDevice::new(1, 1);
        let observer = dev.clone();
        let sink = FrameSink::spawn(dev);
        sink.submit(frame_with(1, 1, Rgb::RED));
        sink.submit(frame_with(1, 1, Rgb::GREEN));
        sink.submit(frame_with(1, 1, Rgb::BLUE));
        let dev = sink.close().await.unwrap();

        let frames = observer.frames();
        assert!(!frames.is_empty() && frames.len() <= 3);
        assert_eq!(frames.last().unwrap().get(0, 0), Some(Rgb::BLUE));
        assert_eq!(dev.flush_count(), frames.len());
    }

    #[tokio::test]
    async fn test_blank_swallows_errors() {
        let mut dev = MemoryDevice::new(1, 2);
        dev.set_fail_flush(true);
        blank(&mut dev).await;
        assert_eq!(dev.flush_count(), 0);

        dev.set_fail_flush(false);
        blank(&mut dev).await;
        assert!(dev.last_frame().unwrap().cells().iter().all(|c| *c == Rgb::BLACK));
    }
}
