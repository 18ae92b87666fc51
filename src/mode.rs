//! Active mode selection.
//!
//! The mode name is derived from the pressed set:
//! 1. held modifiers, sorted and joined with `_` (`alt_shift`)
//! 2. every held key in press order joined with `_` (`q_d`)
//! 3. `base`
//!
//! The first candidate that names a configured mode wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::color::ColorSpec;
use crate::positions::{KeySpec, ALL_GROUP};
use crate::rules::Rule;
use crate::tracker::PressedKeys;

/// Mode used when nothing more specific matches
pub const BASE_MODE: &str = "base";

/// Configured modes by name. Always contains [`BASE_MODE`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModeTable {
    modes: BTreeMap<String, Vec<Rule>>,
}

impl ModeTable {
    pub fn new(mut modes: BTreeMap<String, Vec<Rule>>) -> Self {
        modes.entry(BASE_MODE.to_string()).or_insert_with(|| {
            debug!("No base mode configured, using foreground on all keys");
            vec![default_base_rule()]
        });
        Self { modes }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modes.contains_key(name)
    }

    pub fn rules(&self, name: &str) -> Option<&[Rule]> {
        self.modes.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Rule])> {
        self.modes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// `{ keys = "all", color = "color[1]" }`
pub fn default_base_rule() -> Rule {
    Rule::solid(KeySpec::Name(ALL_GROUP.to_string()), ColorSpec::PaletteIndex(1))
}

/// Pick the mode for the current pressed set.
pub fn resolve_mode(pressed: &PressedKeys, modes: &ModeTable) -> String {
    let mut mods: Vec<&str> = pressed.modifiers().map(|t| t.as_str()).collect();
    mods.sort_unstable();
    let modifier_name = mods.join("_");
    if !modifier_name.is_empty() && modes.contains(&modifier_name) {
        return modifier_name;
    }

    let combo = pressed
        .tokens()
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join("_");
    if !combo.is_empty() && modes.contains(&combo) {
        return combo;
    }

    BASE_MODE.to_string()
}

/// Remembers the last resolved mode to report changes.
#[derive(Debug, Clone)]
pub struct ModeResolver {
    current: String,
}

impl Default for ModeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeResolver {
    pub fn new() -> Self {
        Self {
            current: BASE_MODE.to_string(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Re-resolve and return `(mode, changed)`.
    pub fn update(&mut self, pressed: &PressedKeys, modes: &ModeTable) -> (&str, bool) {
        let next = resolve_mode(pressed, modes);
        let changed = next != self.current;
        if changed {
            debug!("Mode {} -> {next}", self.current);
            self.current = next;
        }
        (&self.current, changed)
    }

    /// Back to `base`
    pub fn reset(&mut self) {
        self.current = BASE_MODE.to_string();
    }
}
