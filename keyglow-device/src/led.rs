//! RGB color type shared by the device backends and the lighting engine

use std::fmt;

/// RGB color value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Black (all LEDs off)
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0 };
    /// White (all LEDs full)
    pub const WHITE: Self = Self {
        r: 255,
        g: 255,
        b: 255,
    };
    /// Red
    pub const RED: Self = Self { r: 255, g: 0, b: 0 };
    /// Green
    pub const GREEN: Self = Self { r: 0, g: 255, b: 0 };
    /// Blue
    pub const BLUE: Self = Self { r: 0, g: 0, b: 255 };

    /// Create a new RGB color
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`. The leading `#` is required and exactly six hex
    /// digits must follow.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::new(r, g, b))
    }

    /// Bytes in wire order (R, G, B)
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Perceived brightness, used to pick readable text on top of a color
    pub fn luma(self) -> u16 {
        (self.r as u16 + self.g as u16 + self.b as u16) / 3
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("#FF0000"), Some(Rgb::RED));
        assert_eq!(Rgb::from_hex("#0a0B0c"), Some(Rgb::new(10, 11, 12)));
        assert_eq!(Rgb::from_hex("FF0000"), None);
        assert_eq!(Rgb::from_hex("#FF00"), None);
        assert_eq!(Rgb::from_hex("#GG0000"), None);
        assert_eq!(Rgb::from_hex("#+F0000"), None);
    }

    #[test]
    fn test_display_roundtrip() {
        let c = Rgb::new(171, 178, 191);
        assert_eq!(c.to_string(), "#ABB2BF");
        assert_eq!(Rgb::from_hex(&c.to_string()), Some(c));
    }

    #[test]
    fn test_luma() {
        assert_eq!(Rgb::BLACK.luma(), 0);
        assert_eq!(Rgb::WHITE.luma(), 255);
    }
}
