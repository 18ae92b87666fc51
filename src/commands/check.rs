//! `keyglow check`

use std::path::Path;

use keyglow::color::Palette;
use keyglow::config::Config;
use keyglow::context::Snapshot;

use super::CommandResult;

/// Grid size assumed when no device is consulted
pub const DEFAULT_ROWS: usize = 6;
pub const DEFAULT_COLS: usize = 22;

/// Parse the config file and report what it resolves to.
pub fn check(config_path: &Path) -> CommandResult {
    let config = Config::load(config_path)?;
    let settings = config.settings.clone();
    let palette_path = settings.palette_path();
    let snapshot = Snapshot::load(config, DEFAULT_ROWS, DEFAULT_COLS);

    println!("Config:     {}", config_path.display());
    println!("pywal:      {}", settings.pywal);
    println!("workspaces: {}", settings.workspace_tracking);
    println!("log:        {}", settings.log);

    println!();
    if settings.pywal {
        println!("Palette ({}):", palette_path.display());
    } else {
        println!("Palette (pywal disabled):");
    }
    print_palette(&snapshot.palette);

    println!();
    println!("Key groups ({DEFAULT_ROWS}x{DEFAULT_COLS} grid):");
    for (name, coords) in snapshot.positions.groups() {
        let shown: Vec<String> = coords.iter().take(6).map(|c| c.to_string()).collect();
        let more = if coords.len() > shown.len() { ", ..." } else { "" };
        println!(
            "  {name:<12} {:>3} key(s)  {}{more}",
            coords.len(),
            shown.join(", ")
        );
    }

    println!();
    println!("Modes:");
    for (name, rules) in snapshot.modes.iter() {
        println!("  {name} ({} rule(s))", rules.len());
        for rule in rules {
            let mut parts = vec![format!("keys={}", rule.keys)];
            if let Some(c) = &rule.color {
                parts.push(format!("color={c}"));
            }
            if let Some(cs) = &rule.colors {
                let cs: Vec<String> = cs.iter().map(|c| c.to_string()).collect();
                parts.push(format!("colors=[{}]", cs.join(", ")));
            }
            if rule.condition.is_some() {
                parts.push(format!(
                    "condition=non_empty_workspaces value={}",
                    rule.value.unwrap_or(true)
                ));
            }
            println!("    - {}", parts.join(" "));
        }
    }
    Ok(())
}

fn print_palette(palette: &Palette) {
    for (i, color) in palette.colors().iter().enumerate() {
        println!("  color[{i}] = {color}");
    }
}
