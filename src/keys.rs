//! Key identity normalization.
//!
//! Every raw evdev key code maps to a [`KeyToken`]: a short lower-case name
//! that mode names and `key_positions` entries are written in. Left and
//! right variants of a modifier share one token. The mapping is total: keys
//! without a dedicated name fall back to their lower-cased evdev name.

use std::fmt;

use evdev::Key;

/// Canonical name of a key or modifier (`"shift"`, `"q"`, `"enter"`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyToken(String);

impl KeyToken {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// One of the four modifier tokens
    pub fn is_modifier(&self) -> bool {
        MODIFIER_TOKENS.contains(&self.0.as_str())
    }
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeyToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for KeyToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Tokens that count as modifiers for mode naming
pub const MODIFIER_TOKENS: [&str; 4] = ["alt", "ctrl", "shift", "super"];

/// A raw key event resolved to its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    pub token: KeyToken,
    /// Raw evdev code, used to track which physical modifier is down
    pub code: u16,
    pub modifier: bool,
}

impl NormalizedKey {
    /// Build directly from a token name (tests, preview)
    pub fn named(name: &str) -> Self {
        let token = KeyToken::new(name);
        let modifier = token.is_modifier();
        Self {
            token,
            code: 0,
            modifier,
        }
    }
}

/// Key press state reported by evdev (`value` field of an EV_KEY event)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Up,
    Down,
    Repeat,
}

impl KeyState {
    pub fn from_value(value: i32) -> Self {
        match value {
            0 => KeyState::Up,
            2 => KeyState::Repeat,
            _ => KeyState::Down,
        }
    }
}

/// Map an evdev key to its canonical token.
pub fn normalize(key: Key) -> NormalizedKey {
    let (name, modifier) = match key {
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => ("shift", true),
        Key::KEY_LEFTALT | Key::KEY_RIGHTALT => ("alt", true),
        Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => ("ctrl", true),
        Key::KEY_LEFTMETA => ("super", true),
        Key::KEY_ENTER | Key::KEY_KPENTER => ("enter", false),
        Key::KEY_SPACE => ("space", false),
        Key::KEY_TAB => ("tab", false),
        Key::KEY_ESC => ("esc", false),
        Key::KEY_BACKSPACE => ("backspace", false),
        _ => {
            return NormalizedKey {
                token: KeyToken::new(character_name(key).unwrap_or_else(|| symbolic_name(key))),
                code: key.code(),
                modifier: false,
            }
        }
    };

    NormalizedKey {
        token: KeyToken::new(name),
        code: key.code(),
        modifier,
    }
}

/// Printable keys map to the character they type without shift.
fn character_name(key: Key) -> Option<String> {
    let c = match key {
        Key::KEY_A => 'a',
        Key::KEY_B => 'b',
        Key::KEY_C => 'c',
        Key::KEY_D => 'd',
        Key::KEY_E => 'e',
        Key::KEY_F => 'f',
        Key::KEY_G => 'g',
        Key::KEY_H => 'h',
        Key::KEY_I => 'i',
        Key::KEY_J => 'j',
        Key::KEY_K => 'k',
        Key::KEY_L => 'l',
        Key::KEY_M => 'm',
        Key::KEY_N => 'n',
        Key::KEY_O => 'o',
        Key::KEY_P => 'p',
        Key::KEY_Q => 'q',
        Key::KEY_R => 'r',
        Key::KEY_S => 's',
        Key::KEY_T => 't',
        Key::KEY_U => 'u',
        Key::KEY_V => 'v',
        Key::KEY_W => 'w',
        Key::KEY_X => 'x',
        Key::KEY_Y => 'y',
        Key::KEY_Z => 'z',
        Key::KEY_1 => '1',
        Key::KEY_2 => '2',
        Key::KEY_3 => '3',
        Key::KEY_4 => '4',
        Key::KEY_5 => '5',
        Key::KEY_6 => '6',
        Key::KEY_7 => '7',
        Key::KEY_8 => '8',
        Key::KEY_9 => '9',
        Key::KEY_0 => '0',
        Key::KEY_MINUS => '-',
        Key::KEY_EQUAL => '=',
        Key::KEY_LEFTBRACE => '[',
        Key::KEY_RIGHTBRACE => ']',
        Key::KEY_SEMICOLON => ';',
        Key::KEY_APOSTROPHE => '\'',
        Key::KEY_GRAVE => '`',
        Key::KEY_BACKSLASH => '\\',
        Key::KEY_COMMA => ',',
        Key::KEY_DOT => '.',
        Key::KEY_SLASH => '/',
        _ => return None,
    };
    Some(c.to_string())
}

/// Best-effort name for everything else: `KEY_F1` -> `f1`.
fn symbolic_name(key: Key) -> String {
    let raw = format!("{key:?}");
    let name = raw.strip_prefix("KEY_").unwrap_or(&raw);
    if name.is_empty() || name.contains(' ') {
        // evdev prints codes it has no name for as "unknown key: N"
        return format!("key_{}", key.code());
    }
    name.to_ascii_lowercase()
}
