//! Shared lighting state.
//!
//! Everything derived from configuration and the palette lives in one
//! immutable [`Snapshot`] behind the reload lock. Reloads build a fresh
//! snapshot off-lock and swap the `Arc`. Pressed keys have their own lock.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::color::Palette;
use crate::config::{Config, ConfigError, Settings};
use crate::keys::{KeyState, NormalizedKey};
use crate::mode::{ModeResolver, ModeTable};
use crate::positions::PositionTable;
use crate::rules::{self, Frame};
use crate::tracker::{PressedKeys, Transition};

/// Configuration-derived state, published as a unit
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub settings: Settings,
    pub palette: Palette,
    pub positions: PositionTable,
    pub modes: ModeTable,
}

impl Snapshot {
    /// Build from a parsed config, reading the palette it points at.
    pub fn load(config: Config, rows: usize, cols: usize) -> Self {
        let palette = Palette::load(config.settings.pywal, &config.settings.palette_path());
        Self::with_palette(config, palette, rows, cols)
    }

    pub fn with_palette(config: Config, palette: Palette, rows: usize, cols: usize) -> Self {
        Self {
            positions: PositionTable::build(rows, cols, &config.key_positions),
            settings: config.settings,
            palette,
            modes: config.modes,
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.positions.dimensions()
    }
}

#[derive(Debug, Default)]
struct KeyTracking {
    pressed: PressedKeys,
    resolver: ModeResolver,
}

/// Owner of all mutable lighting state
pub struct LightingContext {
    config_path: PathBuf,
    snapshot: RwLock<Arc<Snapshot>>,
    keys: Mutex<KeyTracking>,
    workspaces: RwLock<Option<BTreeSet<String>>>,
}

impl LightingContext {
    pub fn new(config_path: impl Into<PathBuf>, snapshot: Snapshot) -> Self {
        Self {
            config_path: config_path.into(),
            snapshot: RwLock::new(Arc::new(snapshot)),
            keys: Mutex::new(KeyTracking::default()),
            workspaces: RwLock::new(None),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Current snapshot. Holding the `Arc` pins it across a reload.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    pub fn settings(&self) -> Settings {
        self.snapshot.read().settings.clone()
    }

    fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write() = Arc::clone(&snapshot);
        snapshot
    }

    /// Feed one key event to the tracker.
    pub fn handle_key(&self, key: &NormalizedKey, state: KeyState) -> Transition {
        let mut keys = self.keys.lock();
        let transition = match state {
            KeyState::Down => keys.pressed.on_key_down(key),
            KeyState::Up => keys.pressed.on_key_up(key),
            KeyState::Repeat => Transition::default(),
        };
        if transition.changed {
            debug!(
                "Pressed: [{}]",
                keys.pressed
                    .tokens()
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        transition
    }

    /// Resolve the mode for the held keys and render it.
    pub fn render_current(&self) -> Frame {
        let snapshot = self.snapshot();
        let mode = {
            let mut keys = self.keys.lock();
            let KeyTracking { pressed, resolver } = &mut *keys;
            resolver.update(pressed, &snapshot.modes).0.to_string()
        };
        let workspaces = self.workspaces.read().clone();
        debug!("Applying lighting for mode: {mode}");
        rules::render(&mode, &snapshot, workspaces.as_ref())
    }

    /// Name of the last rendered mode
    pub fn current_mode(&self) -> String {
        self.keys.lock().resolver.current().to_string()
    }

    /// Forget held keys and go back to `base`. Used when input stops.
    pub fn clear_keys(&self) {
        let mut keys = self.keys.lock();
        keys.pressed.clear();
        keys.resolver.reset();
    }

    /// Re-read the config file and publish a new snapshot.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload_config(&self) -> Result<Arc<Snapshot>, ConfigError> {
        let config = Config::load(&self.config_path)?;
        let (rows, cols) = self.snapshot.read().dimensions();
        let snapshot = self.publish(Snapshot::load(config, rows, cols));
        info!("Configuration reloaded");
        Ok(snapshot)
    }

    /// Re-read the palette file and publish a new snapshot.
    pub fn reload_palette(&self) -> Arc<Snapshot> {
        let current = self.snapshot();
        let palette = Palette::load(current.settings.pywal, &current.settings.palette_path());
        let snapshot = Snapshot {
            palette,
            ..(*current).clone()
        };
        info!("Palette reloaded ({} colors)", snapshot.palette.len());
        self.publish(snapshot)
    }

    /// Replace the occupied-workspace set (`None` disables conditions)
    pub fn set_workspaces(&self, workspaces: Option<BTreeSet<String>>) {
        *self.workspaces.write() = workspaces;
    }

    pub fn workspaces(&self) -> Option<BTreeSet<String>> {
        self.workspaces.read().clone()
    }
}
