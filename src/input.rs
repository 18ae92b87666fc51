//! Keyboard input via evdev.
//!
//! Every keyboard under `/dev/input` gets its own blocking reader thread.
//! Key events are normalized on the reader thread and forwarded to the
//! daemon loop over an unbounded channel.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use evdev::{Device, InputEventKind};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::keys::{normalize, KeyState, NormalizedKey};

/// One normalized key event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: NormalizedKey,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn down(name: &str) -> Self {
        Self {
            key: NormalizedKey::named(name),
            state: KeyState::Down,
        }
    }

    pub fn up(name: &str) -> Self {
        Self {
            key: NormalizedKey::named(name),
            state: KeyState::Up,
        }
    }
}

/// Keyboards under `/dev/input` (anything reporting KEY_A and KEY_SPACE)
pub fn find_keyboard_devices() -> Vec<(PathBuf, Device)> {
    let mut keyboards = Vec::new();
    let Ok(entries) = std::fs::read_dir("/dev/input") else {
        return keyboards;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_event = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("event"));
        if !is_event {
            continue;
        }
        match Device::open(&path) {
            Ok(device) => {
                if device.supported_keys().is_some_and(|keys| {
                    keys.contains(evdev::Key::KEY_A) && keys.contains(evdev::Key::KEY_SPACE)
                }) {
                    keyboards.push((path, device));
                }
            }
            Err(e) => debug!("Skipping {}: {e}", path.display()),
        }
    }
    keyboards
}

/// Spawn one reader thread per keyboard. Returns the handles (empty when
/// no keyboard could be opened, usually a missing `input` group).
pub fn spawn_readers(
    tx: UnboundedSender<KeyEvent>,
    running: Arc<AtomicBool>,
) -> Vec<JoinHandle<()>> {
    let devices = find_keyboard_devices();
    if devices.is_empty() {
        warn!("No readable keyboards under /dev/input (is the user in the 'input' group?)");
    }
    devices
        .into_iter()
        .filter_map(|(path, device)| {
            let name = device.name().unwrap_or("unknown").to_string();
            info!("Listening on {} ({name})", path.display());
            let tx = tx.clone();
            let running = Arc::clone(&running);
            std::thread::Builder::new()
                .name(format!("evdev-{name}"))
                .spawn(move || read_loop(device, &name, &tx, &running))
                .map_err(|e| warn!("Failed to start reader for {}: {e}", path.display()))
                .ok()
        })
        .collect()
}

fn read_loop(
    mut device: Device,
    name: &str,
    tx: &UnboundedSender<KeyEvent>,
    running: &AtomicBool,
) {
    while running.load(Ordering::SeqCst) {
        let events = match device.fetch_events() {
            Ok(events) => events,
            Err(e) => {
                warn!("Input device {name} failed: {e}");
                return;
            }
        };
        for ev in events {
            let InputEventKind::Key(key) = ev.kind() else {
                continue;
            };
            let event = KeyEvent {
                key: normalize(key),
                state: KeyState::from_value(ev.value()),
            };
            if tx.send(event).is_err() {
                debug!("Input channel closed, stopping reader for {name}");
                return;
            }
        }
    }
}
