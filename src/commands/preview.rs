//! `keyglow preview`

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use keyglow::config::Config;
use keyglow::context::Snapshot;
use keyglow::keys::NormalizedKey;
use keyglow::mode::resolve_mode;
use keyglow::preview::{build_labels, print_frame};
use keyglow::rules;
use keyglow::tracker::PressedKeys;

use super::CommandResult;

/// Render the mode for `keys` (or `mode`) and print it as a colored grid.
pub fn preview(
    config_path: &Path,
    keys: &[String],
    mode: Option<&str>,
    workspaces: Option<&[String]>,
    rows: usize,
    cols: usize,
) -> CommandResult {
    anyhow::ensure!(rows > 0 && cols > 0, "grid must be at least 1x1");

    let config = Config::load(config_path)?;
    let snapshot = Snapshot::load(config, rows, cols);

    let mut pressed = PressedKeys::new();
    for name in keys {
        pressed.on_key_down(&NormalizedKey::named(&name.to_ascii_lowercase()));
    }
    let mode = match mode {
        Some(m) => m.to_string(),
        None => resolve_mode(&pressed, &snapshot.modes),
    };
    let workspaces: Option<BTreeSet<String>> = workspaces.map(|w| w.iter().cloned().collect());

    let frame = rules::render(&mode, &snapshot, workspaces.as_ref());
    let header = match &workspaces {
        Some(ws) => format!(
            "mode: {mode}  |  workspaces: {}",
            ws.iter().cloned().collect::<Vec<_>>().join(",")
        ),
        None => format!("mode: {mode}"),
    };

    let mut stdout = io::stdout();
    print_frame(&mut stdout, &header, &frame, &build_labels(&snapshot.positions))?;
    Ok(())
}
