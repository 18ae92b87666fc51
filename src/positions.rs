//! Key name → grid coordinate lookup.
//!
//! Groups come from three places, in order of precedence: the synthesized
//! `all` group, the `[key_positions]` table of the config file, and the
//! built-in defaults below (only for names the config does not mention).
//!
//! ```toml
//! [key_positions]
//! numbers = [[1, 1], [1, 2], [1, 3]]
//! q = [2, 1]
//! enter = "(3, 13)"
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, warn};

/// Name of the synthesized whole-grid group
pub const ALL_GROUP: &str = "all";

/// Name of the group the workspace condition applies to
pub const NUMBERS_GROUP: &str = "numbers";

/// A cell of the lighting grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn in_grid(&self, rows: usize, cols: usize) -> bool {
        self.row < rows && self.col < cols
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The `keys` field of a rule: one group name or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeySpec {
    Name(String),
    List(Vec<KeySpec>),
}

impl KeySpec {
    /// True when this spec is exactly the given single name
    pub fn is_name(&self, name: &str) -> bool {
        matches!(self, KeySpec::Name(n) if n == name)
    }
}

impl From<&str> for KeySpec {
    fn from(name: &str) -> Self {
        KeySpec::Name(name.to_string())
    }
}

impl std::fmt::Display for KeySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySpec::Name(n) => f.write_str(n),
            KeySpec::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Built-in positions for a standard Razer full-size layout.
fn default_positions() -> Vec<(&'static str, Vec<(i64, i64)>)> {
    vec![
        ("super", vec![(5, 1)]),
        ("enter", vec![(3, 13)]),
        ("numbers", (1..=10).map(|c| (1, c)).collect()),
        ("arrows", vec![(5, 14), (5, 15), (5, 16), (4, 15)]),
        ("shift", vec![(4, 0)]),
        ("alt", vec![(5, 2)]),
        ("ctrl", vec![(5, 0)]),
        ("q", vec![(2, 1)]),
        ("d", vec![(3, 3)]),
        ("x", vec![(4, 3)]),
        ("z", vec![(4, 2)]),
        ("space", vec![(5, 7)]),
        ("tab", vec![(2, 0)]),
        ("esc", vec![(1, 0)]),
        ("backspace", vec![(1, 15)]),
    ]
}

/// Immutable name → coordinates table for one grid size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionTable {
    rows: usize,
    cols: usize,
    groups: BTreeMap<String, Vec<Coord>>,
}

impl PositionTable {
    /// Build the table for a `rows × cols` grid from the `[key_positions]` table.
    pub fn build(rows: usize, cols: usize, configured: &BTreeMap<String, toml::Value>) -> Self {
        let mut groups = BTreeMap::new();

        let all: Vec<Coord> = (0..rows)
            .flat_map(|r| (0..cols).map(move |c| Coord::new(r, c)))
            .collect();
        groups.insert(ALL_GROUP.to_string(), all);

        for (name, value) in configured {
            if name == ALL_GROUP {
                warn!("key_positions.all is derived from the grid size, ignoring configured value");
                continue;
            }
            let raw = parse_entry(name, value);
            groups.insert(name.clone(), keep_in_grid(name, raw, rows, cols));
        }

        for (name, raw) in default_positions() {
            if !groups.contains_key(name) {
                groups.insert(name.to_string(), keep_in_grid(name, raw, rows, cols));
            }
        }

        debug!("Position table: {} groups on a {rows}x{cols} grid", groups.len());
        Self { rows, cols, groups }
    }

    /// Table with only the built-in defaults
    pub fn with_defaults(rows: usize, cols: usize) -> Self {
        Self::build(rows, cols, &BTreeMap::new())
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Coordinates of one group, if defined
    pub fn get(&self, name: &str) -> Option<&[Coord]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// All groups in name order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[Coord])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Resolve a rule's `keys` to coordinates.
    ///
    /// Lists concatenate their members' lookups (duplicates kept); unknown
    /// names contribute nothing.
    pub fn positions_for(&self, spec: &KeySpec) -> Vec<Coord> {
        match spec {
            KeySpec::Name(name) => self.groups.get(name).cloned().unwrap_or_default(),
            KeySpec::List(items) => items.iter().flat_map(|s| self.positions_for(s)).collect(),
        }
    }
}

/// Parse one `key_positions` entry into raw (possibly out-of-grid) pairs.
fn parse_entry(name: &str, value: &toml::Value) -> Vec<(i64, i64)> {
    match value {
        toml::Value::Array(items) => {
            if let Some(pair) = parse_pair(items) {
                return vec![pair];
            }
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match parse_item(item) {
                    Some(pair) => out.push(pair),
                    None => warn!("key_positions.{name}: skipping malformed position {item}"),
                }
            }
            out
        }
        toml::Value::String(s) => match parse_tuple_str(s) {
            Some(pair) => vec![pair],
            None => {
                warn!("key_positions.{name}: malformed position {s:?}");
                Vec::new()
            }
        },
        other => {
            warn!("key_positions.{name}: expected a list of positions, got {other}");
            Vec::new()
        }
    }
}

fn parse_item(item: &toml::Value) -> Option<(i64, i64)> {
    match item {
        toml::Value::Array(pair) => parse_pair(pair),
        toml::Value::String(s) => parse_tuple_str(s),
        _ => None,
    }
}

/// `[r, c]`
fn parse_pair(items: &[toml::Value]) -> Option<(i64, i64)> {
    match items {
        [r, c] => Some((as_int(r)?, as_int(c)?)),
        _ => None,
    }
}

/// `"(r, c)"`
fn parse_tuple_str(s: &str) -> Option<(i64, i64)> {
    let inner = s.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (r, c) = inner.split_once(',')?;
    Some((r.trim().parse().ok()?, c.trim().parse().ok()?))
}

fn as_int(value: &toml::Value) -> Option<i64> {
    match value {
        toml::Value::Integer(n) => Some(*n),
        toml::Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
        toml::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn keep_in_grid(name: &str, raw: Vec<(i64, i64)>, rows: usize, cols: usize) -> Vec<Coord> {
    raw.into_iter()
        .filter_map(|(r, c)| {
            let coord = usize::try_from(r)
                .ok()
                .zip(usize::try_from(c).ok())
                .map(|(r, c)| Coord::new(r, c))
                .filter(|coord| coord.in_grid(rows, cols));
            if coord.is_none() {
                warn!("key_positions.{name}: ({r}, {c}) is outside the {rows}x{cols} grid");
            }
            coord
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured(src: &str) -> BTreeMap<String, toml::Value> {
        toml::from_str(src).unwrap()
    }

    #[test]
    fn test_all_covers_grid() {
        let t = PositionTable::with_defaults(6, 22);
        let all = t.get(ALL_GROUP).unwrap();
        assert_eq!(all.len(), 6 * 22);
        assert_eq!(all[0], Coord::new(0, 0));
        assert_eq!(all[all.len() - 1], Coord::new(5, 21));
    }

    #[test]
    fn test_defaults_backfilled() {
        let t = PositionTable::with_defaults(6, 22);
        assert_eq!(t.get("super").unwrap(), &[Coord::new(5, 1)]);
        assert_eq!(t.get("numbers").unwrap().len(), 10);
        assert_eq!(t.get("numbers").unwrap()[9], Coord::new(1, 10));
        assert_eq!(t.get("arrows").unwrap()[3], Coord::new(4, 15));
    }

    #[test]
    fn test_configured_overrides_default() {
        let t = PositionTable::build(6, 22, &configured("q = [[0, 0], [0, 1]]"));
        assert_eq!(t.get("q").unwrap(), &[Coord::new(0, 0), Coord::new(0, 1)]);
        assert_eq!(t.get("d").unwrap(), &[Coord::new(3, 3)]);
    }

    #[test]
    fn test_configured_all_ignored() {
        let t = PositionTable::build(2, 2, &configured("all = [[0, 0]]"));
        assert_eq!(t.get(ALL_GROUP).unwrap().len(), 4);
    }

    #[test]
    fn test_entry_forms() {
        let t = PositionTable::build(
            6,
            22,
            &configured(
                r#"
                pair = [2, 3]
                text = "(4, 5)"
                mixed = [[0, 1], "(1, 2)", "nonsense", [1], [3.0, 4]]
                "#,
            ),
        );
        assert_eq!(t.get("pair").unwrap(), &[Coord::new(2, 3)]);
        assert_eq!(t.get("text").unwrap(), &[Coord::new(4, 5)]);
        assert_eq!(
            t.get("mixed").unwrap(),
            &[Coord::new(0, 1), Coord::new(1, 2), Coord::new(3, 4)]
        );
    }

    #[test]
    fn test_malformed_entry_blocks_default() {
        let t = PositionTable::build(6, 22, &configured("enter = \"garbage\""));
        assert_eq!(t.get("enter"), Some(&[][..]));
    }

    #[test]
    fn test_out_of_grid_discarded() {
        let t = PositionTable::build(6, 16, &configured("k = [[0, 0], [6, 0], [0, 16], [-1, 2]]"));
        assert_eq!(t.get("k").unwrap(), &[Coord::new(0, 0)]);
        // arrows default has (5, 16) which is off a 16-column grid
        assert_eq!(t.get("arrows").unwrap().len(), 3);
    }

    #[test]
    fn test_positions_for_lists() {
        let t = PositionTable::with_defaults(6, 22);
        let spec = KeySpec::List(vec!["q".into(), "unknown".into(), "q".into()]);
        assert_eq!(t.positions_for(&spec), vec![Coord::new(2, 1), Coord::new(2, 1)]);
        assert!(t.positions_for(&"nope".into()).is_empty());
    }

    #[test]
    fn test_build_deterministic() {
        let cfg = configured("a = [[1, 1], \"(2, 2)\"]\nb = [0, 0]");
        assert_eq!(PositionTable::build(6, 22, &cfg), PositionTable::build(6, 22, &cfg));
    }

    #[test]
    fn test_keyspec_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            keys: KeySpec,
        }
        let h: Holder = toml::from_str(r#"keys = "all""#).unwrap();
        assert!(h.keys.is_name("all"));
        let h: Holder = toml::from_str(r#"keys = ["q", ["d", "x"]]"#).unwrap();
        assert_eq!(h.keys.to_string(), "[q, [d, x]]");
    }
}
