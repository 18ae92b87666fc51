// keyglow - mode-aware per-key keyboard lighting
// Lighting-state resolution engine plus its I/O collaborators

pub mod color;
pub mod config;
pub mod context;
pub mod daemon;
pub mod input;
pub mod keys;
pub mod logging;
pub mod mode;
pub mod positions;
pub mod preview;
pub mod rules;
pub mod sink;
pub mod tracker;
pub mod watcher;
pub mod workspace;

pub use color::{ColorSpec, Palette, Rgb};
pub use config::{Config, ConfigError, Settings};
pub use context::{LightingContext, Snapshot};
pub use daemon::Daemon;
pub use keys::{normalize, KeyState, KeyToken, NormalizedKey};
pub use mode::{resolve_mode, ModeResolver, ModeTable, BASE_MODE};
pub use positions::{Coord, KeySpec, PositionTable};
pub use rules::{render, Condition, Frame, Rule};
pub use tracker::{PressedKeys, Transition};
pub use workspace::{I3Client, WorkspaceError, WorkspaceSource};
