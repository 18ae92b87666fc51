//! Configuration file loading.
//!
//! The document is TOML. Top-level switches deserialize strictly; the
//! `key_positions` and `modes` sections are kept as raw values and parsed
//! entry by entry so one bad rule never rejects the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::color::default_wal_colors_path;
use crate::mode::ModeTable;
use crate::rules::Rule;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Raw shape of the config document
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    #[serde(default = "default_true")]
    pywal: bool,
    // Spellings of the same switch, merged by `workspace_tracking()`
    #[serde(default)]
    workspace_tracking: Option<bool>,
    #[serde(default, rename = "i3/workspace-tracking")]
    i3_workspace_tracking: Option<bool>,
    #[serde(default, rename = "workspace-tracking")]
    workspace_tracking_dashed: Option<bool>,
    #[serde(default)]
    i3: Option<bool>,
    #[serde(default)]
    log: bool,
    #[serde(default)]
    palette_file: Option<PathBuf>,
    #[serde(default)]
    key_positions: BTreeMap<String, toml::Value>,
    #[serde(default)]
    modes: BTreeMap<String, toml::Value>,
}

fn default_true() -> bool {
    true
}

impl ConfigFile {
    /// First set spelling wins, in declaration order. Defaults to on.
    fn workspace_tracking(&self) -> bool {
        let set: Vec<(&str, bool)> = [
            ("workspace_tracking", self.workspace_tracking),
            ("i3/workspace-tracking", self.i3_workspace_tracking),
            ("workspace-tracking", self.workspace_tracking_dashed),
            ("i3", self.i3),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

        match set.as_slice() {
            [] => true,
            [(key, value), rest @ ..] => {
                if let Some((other, _)) = rest.iter().find(|(_, v)| v != value) {
                    warn!("{key} = {value} conflicts with {other}, using {key}");
                }
                *value
            }
        }
    }
}

/// Top-level switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Read the palette from the pywal cache
    pub pywal: bool,
    /// Query i3/sway for occupied workspaces
    pub workspace_tracking: bool,
    /// Verbose logging
    pub log: bool,
    /// Palette file override
    pub palette_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pywal: true,
            workspace_tracking: true,
            log: false,
            palette_file: None,
        }
    }
}

impl Settings {
    /// Palette file to read (and watch)
    pub fn palette_path(&self) -> PathBuf {
        match &self.palette_file {
            Some(p) => expand_home(p),
            None => default_wal_colors_path(),
        }
    }

    /// Log level implied by the `log` switch
    pub fn log_level(&self) -> &'static str {
        if self.log {
            "debug"
        } else {
            "info"
        }
    }
}

/// Parsed configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub settings: Settings,
    /// Raw `[key_positions]`, resolved against the grid size later
    pub key_positions: BTreeMap<String, toml::Value>,
    pub modes: ModeTable,
}

impl Default for Config {
    fn default() -> Self {
        match Self::from_toml(DEFAULT_CONFIG_TOML) {
            Ok(config) => config,
            Err(e) => {
                warn!("Built-in config failed to parse: {e}");
                Self {
                    settings: Settings::default(),
                    key_positions: BTreeMap::new(),
                    modes: ModeTable::new(BTreeMap::new()),
                }
            }
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/keyglow/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keyglow")
            .join("config.toml")
    }

    /// Load from a file. A missing file gives the built-in configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config at {}, using built-in defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Loaded config from {}: {} modes, {} position entries",
            path.display(),
            config.modes.len(),
            config.key_positions.len()
        );
        Ok(config)
    }

    /// Startup variant of [`Config::load`]: errors fall back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!("{e}; using built-in defaults");
            Self::default()
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let workspace_tracking = file.workspace_tracking();
        Ok(Self {
            settings: Settings {
                pywal: file.pywal,
                workspace_tracking,
                log: file.log,
                palette_file: file.palette_file,
            },
            key_positions: file.key_positions,
            modes: parse_modes(&file.modes),
        })
    }
}

fn parse_modes(raw: &BTreeMap<String, toml::Value>) -> ModeTable {
    let mut modes = BTreeMap::new();
    for (name, value) in raw {
        let Some(table) = value.as_table() else {
            warn!("modes.{name}: expected a table with a rules list, skipping");
            continue;
        };
        let rules = match table.get("rules") {
            Some(toml::Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, v)| Rule::from_value(&format!("modes.{name}.rules[{i}]"), v))
                .collect(),
            Some(other) => {
                warn!("modes.{name}.rules: expected a list, got {other}");
                Vec::new()
            }
            None => Vec::new(),
        };
        modes.insert(name.clone(), rules);
    }
    ModeTable::new(modes)
}

/// `~/x` -> `$HOME/x`
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Configuration used when no file exists
pub const DEFAULT_CONFIG_TOML: &str = r##"# keyglow configuration
#
# Colors: [r, g, b], "#RRGGBB", or "color[N]" (pywal palette index).
# keys:   a group name from key_positions, "all", or a list of names.
# Modes are named after held keys: modifiers sorted and joined with "_"
# ("alt_shift"), or every held key in press order ("q_d").

pywal = true
workspace_tracking = true
log = false

[modes.base]
rules = [
    { keys = "all", color = "color[1]" },
]

[modes.super]
rules = [
    { keys = "all", color = "color[0]" },
    { keys = "numbers", condition = "non_empty_workspaces", value = true, color = "color[4]" },
    { keys = "numbers", condition = "non_empty_workspaces", value = false, color = "color[8]" },
    { keys = ["enter", "q", "d"], color = "color[2]" },
    { keys = "arrows", color = "color[5]" },
]

[modes.shift]
rules = [
    { keys = "all", color = "color[0]" },
    { keys = "shift", color = "color[3]" },
]

[modes.ctrl]
rules = [
    { keys = "all", color = "color[0]" },
    { keys = ["ctrl", "x", "z"], colors = ["color[6]", "color[2]", "color[5]"] },
]
"##;
