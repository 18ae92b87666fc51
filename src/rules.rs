//! Rule evaluation: mode + snapshot → frame.
//!
//! A mode is an ordered list of rules. Each rule paints a set of cells and
//! later rules overwrite earlier ones. Cells nothing paints stay black.
//!
//! ```toml
//! [[modes.super.rules]]
//! keys = "numbers"
//! condition = "non_empty_workspaces"
//! value = true
//! color = "color[4]"
//! ```

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::color::{ColorSpec, Palette, Rgb};
use crate::context::Snapshot;
use crate::mode::BASE_MODE;
use crate::positions::{Coord, KeySpec, PositionTable, NUMBERS_GROUP};

// ── Rule ─────────────────────────────────────────────────────────────

/// Extra gate on a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Paint `numbers[i]` when workspace `i+1` occupancy equals `value`
    NonEmptyWorkspaces,
}

impl Condition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "non_empty_workspaces" => Some(Condition::NonEmptyWorkspaces),
            _ => None,
        }
    }
}

/// One entry of a mode's `rules` list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub keys: KeySpec,
    pub color: Option<ColorSpec>,
    pub colors: Option<Vec<ColorSpec>>,
    pub condition: Option<Condition>,
    /// Expected occupancy for the workspace condition (default: true)
    pub value: Option<bool>,
}

impl Rule {
    /// Paint `keys` with one color
    pub fn solid(keys: KeySpec, color: ColorSpec) -> Self {
        Self {
            keys,
            color: Some(color),
            colors: None,
            condition: None,
            value: None,
        }
    }

    /// Paint `keys` cell by cell
    pub fn per_key(keys: KeySpec, colors: Vec<ColorSpec>) -> Self {
        Self {
            keys,
            color: None,
            colors: Some(colors),
            condition: None,
            value: None,
        }
    }

    /// Workspace-gated rule over `numbers`
    pub fn workspaces(value: bool, color: ColorSpec) -> Self {
        Self {
            keys: KeySpec::Name(NUMBERS_GROUP.to_string()),
            color: Some(color),
            colors: None,
            condition: Some(Condition::NonEmptyWorkspaces),
            value: Some(value),
        }
    }

    /// Parse a rule leniently from its TOML table.
    ///
    /// Bad fields are logged and dropped. Only a non-table rule is rejected.
    pub fn from_value(context: &str, value: &toml::Value) -> Option<Self> {
        let table = match value.as_table() {
            Some(t) => t,
            None => {
                warn!("{context}: rule must be a table, got {value}");
                return None;
            }
        };

        let keys = match table.get("keys") {
            Some(v) => match v.clone().try_into::<KeySpec>() {
                Ok(keys) => keys,
                Err(_) => {
                    warn!("{context}: keys must be a name or a list of names, got {v}");
                    KeySpec::List(Vec::new())
                }
            },
            None => {
                warn!("{context}: rule has no keys");
                KeySpec::List(Vec::new())
            }
        };

        let color = table.get("color").cloned().map(ColorSpec::from);

        let colors = match table.get("colors") {
            Some(toml::Value::Array(items)) => {
                Some(items.iter().cloned().map(ColorSpec::from).collect())
            }
            Some(other) => {
                warn!("{context}: colors must be a list, got {other}");
                None
            }
            None => None,
        };

        let condition = match table.get("condition") {
            Some(toml::Value::String(s)) if s == "none" => None,
            Some(toml::Value::String(s)) => {
                let parsed = Condition::parse(s);
                if parsed.is_none() {
                    warn!("{context}: unknown condition {s:?}, ignoring");
                }
                parsed
            }
            Some(other) => {
                warn!("{context}: condition must be a string, got {other}");
                None
            }
            None => None,
        };

        let value = match table.get("value") {
            Some(toml::Value::Boolean(b)) => Some(*b),
            Some(other) => {
                warn!("{context}: value must be a boolean, got {other}");
                None
            }
            None => None,
        };

        Some(Self {
            keys,
            color,
            colors,
            condition,
            value,
        })
    }

    /// `keys` names the numbers group, alone
    fn targets_numbers(&self) -> bool {
        match &self.keys {
            KeySpec::Name(n) => n == NUMBERS_GROUP,
            KeySpec::List(items) => items.len() == 1 && items[0].is_name(NUMBERS_GROUP),
        }
    }
}

// ── Frame ────────────────────────────────────────────────────────────

/// Fully defined `rows × cols` color grid, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    rows: usize,
    cols: usize,
    cells: Vec<Rgb>,
}

impl Frame {
    /// All-black frame
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![Rgb::BLACK; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Rgb> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Set one cell. Returns false (and leaves the frame alone) off-grid.
    pub fn set(&mut self, coord: Coord, color: Rgb) -> bool {
        if !coord.in_grid(self.rows, self.cols) {
            return false;
        }
        self.cells[coord.row * self.cols + coord.col] = color;
        true
    }

    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }

    /// Cells grouped by row
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.cells.chunks(self.cols.max(1))
    }

    /// `(coord, color)` for every cell, row-major
    pub fn iter(&self) -> impl Iterator<Item = (Coord, Rgb)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (Coord::new(i / cols, i % cols), *c))
    }

    pub fn is_black(&self) -> bool {
        self.cells.iter().all(|c| *c == Rgb::BLACK)
    }
}

// ── Engine ───────────────────────────────────────────────────────────

/// Render `mode` against one snapshot.
///
/// Unknown modes fall back to `base`. `workspaces` is `None` when
/// workspace tracking is off or unavailable.
pub fn render(mode: &str, snapshot: &Snapshot, workspaces: Option<&BTreeSet<String>>) -> Frame {
    let (rows, cols) = snapshot.positions.dimensions();
    let mut frame = Frame::new(rows, cols);

    let rules = match snapshot.modes.rules(mode) {
        Some(rules) => rules,
        None => {
            debug!("Mode '{mode}' not defined, falling back to {BASE_MODE}");
            snapshot.modes.rules(BASE_MODE).unwrap_or(&[])
        }
    };

    for rule in rules {
        apply_rule(
            &mut frame,
            rule,
            &snapshot.positions,
            &snapshot.palette,
            workspaces,
        );
    }
    frame
}

/// Apply one rule on top of `frame`.
pub fn apply_rule(
    frame: &mut Frame,
    rule: &Rule,
    positions: &PositionTable,
    palette: &Palette,
    workspaces: Option<&BTreeSet<String>>,
) {
    let coords = positions.positions_for(&rule.keys);
    if coords.is_empty() {
        debug!("No positions found for keys {}", rule.keys);
        return;
    }

    if let Some(colors) = &rule.colors {
        for (coord, spec) in coords.iter().zip(colors) {
            paint(frame, *coord, palette.resolve(spec));
        }
    }

    if let Some(Condition::NonEmptyWorkspaces) = rule.condition {
        let (Some(workspaces), true) = (workspaces, rule.targets_numbers()) else {
            return;
        };
        let expected = rule.value.unwrap_or(true);
        let color = resolve_optional(palette, rule.color.as_ref());
        for (i, coord) in coords.iter().enumerate() {
            let label = (i + 1).to_string();
            if workspaces.contains(&label) == expected {
                paint(frame, *coord, color);
            }
        }
        return;
    }

    if let Some(spec) = &rule.color {
        let color = palette.resolve(spec);
        for coord in &coords {
            paint(frame, *coord, color);
        }
    }
}

fn resolve_optional(palette: &Palette, spec: Option<&ColorSpec>) -> Rgb {
    match spec {
        Some(spec) => palette.resolve(spec),
        None => {
            warn!("Workspace rule has no color, using black");
            Rgb::BLACK
        }
    }
}

fn paint(frame: &mut Frame, coord: Coord, color: Rgb) {
    if !frame.set(coord, color) {
        debug!("Skipping off-grid cell {coord}");
    }
}
