//! OpenRazer backend over the session D-Bus.
//!
//! The `openrazer-daemon` owns the kernel driver and exposes each device at
//! `/org/razer/device/<serial>`. Custom frames are uploaded with
//! `setKeyRow` (one `[row, start_col, end_col, r, g, b, ...]` record per row)
//! and made visible with `setCustom`.

use async_trait::async_trait;
use tracing::{debug, info, warn};
use zbus::{Connection, Proxy};

use crate::error::DeviceError;
use crate::led::Rgb;
use crate::types::DeviceInfo;
use crate::{CellBuffer, LightingDevice};

const SERVICE: &str = "org.razer";
const ROOT_PATH: &str = "/org/razer";
const DEVICES_IFACE: &str = "razer.devices";
const MISC_IFACE: &str = "razer.device.misc";
const CHROMA_IFACE: &str = "razer.device.lighting.chroma";

fn device_path(serial: &str) -> String {
    format!("{ROOT_PATH}/device/{serial}")
}

/// Encode a full frame as the `setKeyRow` payload.
pub fn encode_key_rows(buffer: &CellBuffer) -> Vec<u8> {
    let mut payload = Vec::with_capacity(buffer.cells().len() * 3 + 3 * 32);
    for (row, cells) in buffer.rows().enumerate() {
        if cells.is_empty() {
            continue;
        }
        payload.push(row as u8);
        payload.push(0);
        payload.push((cells.len() - 1) as u8);
        for cell in cells {
            payload.extend_from_slice(&cell.to_bytes());
        }
    }
    payload
}

/// OpenRazer device discovery
pub struct OpenRazerDiscovery {
    conn: Connection,
}

impl OpenRazerDiscovery {
    /// Connect to the session bus
    pub async fn connect() -> Result<Self, DeviceError> {
        let conn = Connection::session().await?;
        Ok(Self { conn })
    }

    async fn proxy(&self, path: String, iface: &'static str) -> Result<Proxy<'static>, DeviceError> {
        Ok(Proxy::new_owned(self.conn.clone(), SERVICE, path, iface).await?)
    }

    /// List every device the daemon knows about, supported or not
    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>, DeviceError> {
        let root = self.proxy(ROOT_PATH.to_string(), DEVICES_IFACE).await?;
        let reply = root.call_method("getDevices", &()).await?;
        let serials: Vec<String> = reply.body().deserialize()?;

        let mut devices = Vec::with_capacity(serials.len());
        for serial in serials {
            match self.query_device(&serial).await {
                Ok(info) => devices.push(info),
                Err(e) => warn!("Skipping OpenRazer device {serial}: {e}"),
            }
        }
        Ok(devices)
    }

    async fn query_device(&self, serial: &str) -> Result<DeviceInfo, DeviceError> {
        let misc = self.proxy(device_path(serial), MISC_IFACE).await?;

        let name: String = misc
            .call_method("getDeviceName", &())
            .await?
            .body()
            .deserialize()?;
        let vid_pid: Vec<i32> = misc
            .call_method("getVidPid", &())
            .await?
            .body()
            .deserialize()?;
        let (vid, pid) = match vid_pid.as_slice() {
            [vid, pid] => (*vid as u16, *pid as u16),
            other => {
                return Err(DeviceError::UnexpectedResponse(format!(
                    "getVidPid returned {other:?}"
                )))
            }
        };

        // Devices without a matrix do not implement getMatrixDimensions
        let (rows, cols) = match misc.call_method("getMatrixDimensions", &()).await {
            Ok(reply) => {
                let dims: Vec<i32> = reply.body().deserialize()?;
                match dims.as_slice() {
                    [rows, cols] if *rows > 0 && *cols > 0 => (*rows as usize, *cols as usize),
                    _ => (0, 0),
                }
            }
            Err(e) => {
                debug!("{serial}: no matrix ({e})");
                (0, 0)
            }
        };

        Ok(DeviceInfo {
            serial: serial.to_string(),
            name,
            vid,
            pid,
            rows,
            cols,
        })
    }

    /// Open a specific device for custom-frame lighting
    pub async fn open(&self, info: &DeviceInfo) -> Result<OpenRazerKeyboard, DeviceError> {
        if info.rows == 0 || info.cols == 0 {
            return Err(DeviceError::NotFound(format!(
                "{} has no per-key matrix",
                info.name
            )));
        }
        let chroma = self.proxy(device_path(&info.serial), CHROMA_IFACE).await?;
        Ok(OpenRazerKeyboard {
            info: info.clone(),
            chroma,
            buffer: CellBuffer::new(info.rows, info.cols),
        })
    }

    /// Open the first supported keyboard
    pub async fn open_preferred(&self) -> Result<OpenRazerKeyboard, DeviceError> {
        let devices = self.list_devices().await?;
        for dev in &devices {
            debug!("Checking device: {} ({})", dev.name, dev.vid_pid());
        }

        let Some(info) = devices
            .iter()
            .find(|d| d.is_supported() && d.rows > 0 && d.cols > 0)
        else {
            return Err(DeviceError::NotFound(
                "No supported Razer keyboard found".into(),
            ));
        };

        info!(
            "Using keyboard: {} ({}) {}x{}",
            info.name,
            info.vid_pid(),
            info.rows,
            info.cols
        );
        self.open(info).await
    }
}

/// A Razer keyboard driven through `razer.device.lighting.chroma`
pub struct OpenRazerKeyboard {
    info: DeviceInfo,
    chroma: Proxy<'static>,
    buffer: CellBuffer,
}

#[async_trait]
impl LightingDevice for OpenRazerKeyboard {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn set_cell(&mut self, row: usize, col: usize, color: Rgb) -> Result<(), DeviceError> {
        self.buffer.set(row, col, color)
    }

    async fn flush(&mut self) -> Result<(), DeviceError> {
        let payload = encode_key_rows(&self.buffer);
        self.chroma.call_method("setKeyRow", &(payload,)).await?;
        self.chroma.call_method("setCustom", &()).await?;
        Ok(())
    }
}
