//! Pressed-key tracking.
//!
//! [`PressedKeys`] keeps the held tokens in the order they were pressed and
//! decides, per event, whether the lighting should be recomputed.

use std::collections::BTreeSet;

use crate::keys::{KeyToken, NormalizedKey};

/// Outcome of feeding one key event to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// The pressed set was modified
    pub changed: bool,
    /// The frame should be recomputed
    pub refresh: bool,
    /// Workspace occupancy should be re-queried before rendering
    pub refresh_workspaces: bool,
}

/// Ordered set of currently held keys
#[derive(Debug, Clone, Default)]
pub struct PressedKeys {
    order: Vec<KeyToken>,
    /// Raw codes of modifier keys currently down
    raw_modifiers: BTreeSet<u16>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key press.
    pub fn on_key_down(&mut self, key: &NormalizedKey) -> Transition {
        if key.modifier {
            self.raw_modifiers.insert(key.code);
        }
        let changed = if self.order.contains(&key.token) {
            false
        } else {
            self.order.push(key.token.clone());
            true
        };

        Transition {
            changed,
            refresh: !self.order.is_empty(),
            refresh_workspaces: matches!(key.token.as_str(), "super" | "alt"),
        }
    }

    /// Record a key release.
    ///
    /// Releasing either physical key of a modifier pair drops the shared
    /// token, even if the other one is still held.
    pub fn on_key_up(&mut self, key: &NormalizedKey) -> Transition {
        if key.modifier {
            self.raw_modifiers.remove(&key.code);
        }
        let before = self.order.len();
        self.order.retain(|t| t != &key.token);
        let changed = self.order.len() != before;

        Transition {
            changed,
            refresh: !self.order.is_empty() || key.modifier,
            refresh_workspaces: false,
        }
    }

    /// Held tokens in press order
    pub fn tokens(&self) -> &[KeyToken] {
        &self.order
    }

    /// Held modifier tokens in press order
    pub fn modifiers(&self) -> impl Iterator<Item = &KeyToken> {
        self.order.iter().filter(|t| t.is_modifier())
    }

    /// Raw modifier codes currently down
    pub fn raw_modifiers(&self) -> &BTreeSet<u16> {
        &self.raw_modifiers
    }

    pub fn contains(&self, token: &str) -> bool {
        self.order.iter().any(|t| t.as_str() == token)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.raw_modifiers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::normalize;
    use evdev::Key;

    fn tokens(p: &PressedKeys) -> Vec<&str> {
        p.tokens().iter().map(KeyToken::as_str).collect()
    }

    #[test]
    fn test_press_order_without_duplicates() {
        let mut p = PressedKeys::new();
        p.on_key_down(&normalize(Key::KEY_Q));
        p.on_key_down(&normalize(Key::KEY_D));
        let t = p.on_key_down(&normalize(Key::KEY_Q));
        assert!(!t.changed);
        assert!(t.refresh);
        assert_eq!(tokens(&p), ["q", "d"]);
    }

    #[test]
    fn test_modifier_pair_shares_token() {
        let mut p = PressedKeys::new();
        p.on_key_down(&normalize(Key::KEY_LEFTSHIFT));
        p.on_key_down(&normalize(Key::KEY_RIGHTSHIFT));
        assert_eq!(tokens(&p), ["shift"]);
        assert_eq!(p.raw_modifiers().len(), 2);

        // Either release clears the token
        let t = p.on_key_up(&normalize(Key::KEY_RIGHTSHIFT));
        assert!(t.changed);
        assert!(p.is_empty());
        assert_eq!(p.raw_modifiers().len(), 1);
    }

    #[test]
    fn test_release_refresh_rules() {
        let mut p = PressedKeys::new();
        p.on_key_down(&normalize(Key::KEY_Q));
        // Last non-modifier release leaves the previous lighting in place
        let t = p.on_key_up(&normalize(Key::KEY_Q));
        assert!(t.changed);
        assert!(!t.refresh);

        p.on_key_down(&normalize(Key::KEY_LEFTCTRL));
        let t = p.on_key_up(&normalize(Key::KEY_LEFTCTRL));
        assert!(t.refresh);

        p.on_key_down(&normalize(Key::KEY_Q));
        p.on_key_down(&normalize(Key::KEY_D));
        let t = p.on_key_up(&normalize(Key::KEY_Q));
        assert!(t.refresh);
        assert_eq!(tokens(&p), ["d"]);
    }

    #[test]
    fn test_release_of_unheld_key() {
        let mut p = PressedKeys::new();
        let t = p.on_key_up(&normalize(Key::KEY_Z));
        assert_eq!(t, Transition::default());
    }

    #[test]
    fn test_workspace_refresh_on_super_and_alt() {
        let mut p = PressedKeys::new();
        assert!(p.on_key_down(&normalize(Key::KEY_LEFTMETA)).refresh_workspaces);
        assert!(p.on_key_down(&normalize(Key::KEY_LEFTALT)).refresh_workspaces);
        assert!(!p.on_key_down(&normalize(Key::KEY_LEFTCTRL)).refresh_workspaces);
        assert_eq!(
            p.modifiers().map(KeyToken::as_str).collect::<Vec<_>>(),
            ["super", "alt", "ctrl"]
        );
    }
}
