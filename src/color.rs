//! Palettes and color specifications.
//!
//! A rule names its color in one of three ways:
//!
//! ```toml
//! color = [255, 0, 0]   # literal RGB
//! color = "color[4]"    # palette index
//! color = "#E0AF68"     # hex literal
//! ```
//!
//! Resolution never fails: anything unusable becomes black and is logged.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, error, warn};

pub use keyglow_device::Rgb;

// ── ColorSpec ────────────────────────────────────────────────────────

/// A color as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "toml::Value")]
pub enum ColorSpec {
    /// `[r, g, b]`
    Literal(Rgb),
    /// `"color[N]"`
    PaletteIndex(usize),
    /// `"#RRGGBB"` (validated at resolve time)
    Hex(String),
    /// Anything else, kept verbatim for the error message
    Invalid(String),
}

impl ColorSpec {
    /// Interpret a configuration string.
    pub fn parse(s: &str) -> Self {
        if let Some(idx) = parse_palette_ref(s) {
            return ColorSpec::PaletteIndex(idx);
        }
        if s.starts_with('#') {
            return ColorSpec::Hex(s.to_string());
        }
        ColorSpec::Invalid(s.to_string())
    }
}

/// `color[N]` -> N
fn parse_palette_ref(s: &str) -> Option<usize> {
    s.strip_prefix("color[")?.strip_suffix(']')?.parse().ok()
}

impl From<toml::Value> for ColorSpec {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => ColorSpec::parse(&s),
            toml::Value::Array(ref items) if items.len() == 3 => {
                let channels: Vec<Option<u8>> = items
                    .iter()
                    .map(|v| v.as_integer().and_then(|n| u8::try_from(n).ok()))
                    .collect();
                match channels.as_slice() {
                    [Some(r), Some(g), Some(b)] => ColorSpec::Literal(Rgb::new(*r, *g, *b)),
                    _ => ColorSpec::Invalid(value.to_string()),
                }
            }
            other => ColorSpec::Invalid(other.to_string()),
        }
    }
}

impl From<Rgb> for ColorSpec {
    fn from(rgb: Rgb) -> Self {
        ColorSpec::Literal(rgb)
    }
}

impl fmt::Display for ColorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorSpec::Literal(c) => write!(f, "[{}, {}, {}]", c.r, c.g, c.b),
            ColorSpec::PaletteIndex(i) => write!(f, "color[{i}]"),
            ColorSpec::Hex(s) | ColorSpec::Invalid(s) => f.write_str(s),
        }
    }
}

// ── Palette ──────────────────────────────────────────────────────────

/// Fallback when pywal is enabled but its cache is missing or unusable
pub const PYWAL_FALLBACK: [Rgb; 9] = [
    Rgb::new(55, 59, 67),    // background
    Rgb::new(171, 178, 191), // foreground
    Rgb::new(191, 97, 106),  // red
    Rgb::new(163, 190, 140), // green
    Rgb::new(224, 175, 104), // yellow
    Rgb::new(129, 162, 190), // blue
    Rgb::new(180, 142, 173), // magenta
    Rgb::new(139, 213, 202), // cyan
    Rgb::new(92, 99, 112),   // light gray
];

/// Palette used when pywal is disabled
pub const PLAIN_PALETTE: [Rgb; 2] = [
    Rgb::new(100, 100, 100), // default
    Rgb::new(200, 200, 200), // highlight
];

/// Ordered, index-addressable color list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// Built-in palette for the given pywal setting
    pub fn fallback(pywal: bool) -> Self {
        if pywal {
            Self::new(PYWAL_FALLBACK.to_vec())
        } else {
            Self::new(PLAIN_PALETTE.to_vec())
        }
    }

    /// Load the palette for the current settings.
    ///
    /// With pywal enabled the cache file is read and any empty result falls
    /// back to the 9-color default. With pywal disabled the file is ignored.
    pub fn load(pywal: bool, path: &Path) -> Self {
        if !pywal {
            debug!("Pywal disabled, using default colors");
            return Self::fallback(false);
        }
        let colors = read_wal_colors(path);
        if colors.is_empty() {
            warn!("No usable colors in {}, using fallback palette", path.display());
            Self::fallback(true)
        } else {
            debug!("Loaded {} colors from {}", colors.len(), path.display());
            Self::new(colors)
        }
    }

    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Resolve a color specification. Total: failures give black.
    pub fn resolve(&self, spec: &ColorSpec) -> Rgb {
        match spec {
            ColorSpec::Literal(c) => *c,
            ColorSpec::PaletteIndex(i) => match self.get(*i) {
                Some(c) => c,
                None => {
                    error!(
                        "Palette index color[{i}] out of range ({} colors), using black",
                        self.len()
                    );
                    Rgb::BLACK
                }
            },
            ColorSpec::Hex(s) => Rgb::from_hex(s).unwrap_or_else(|| {
                error!("Malformed hex color {s:?}, using black");
                Rgb::BLACK
            }),
            ColorSpec::Invalid(s) => {
                error!("Unrecognized color {s}, using black");
                Rgb::BLACK
            }
        }
    }
}

// ── pywal cache ──────────────────────────────────────────────────────

/// Default pywal colors file (`~/.cache/wal/colors`)
pub fn default_wal_colors_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("wal")
        .join("colors")
}

/// Parse a pywal `colors` file: one `#RRGGBB` per line, blank lines ignored.
///
/// Any malformed line invalidates the whole file.
pub fn parse_wal_colors(content: &str) -> Vec<Rgb> {
    let mut colors = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let cleaned = line.trim();
        if cleaned.is_empty() {
            continue;
        }
        let hex = format!("#{}", cleaned.trim_start_matches('#'));
        match Rgb::from_hex(&hex) {
            Some(c) => colors.push(c),
            None => {
                warn!("Malformed palette line {}: {cleaned:?}", lineno + 1);
                return Vec::new();
            }
        }
    }
    colors
}

/// Read the pywal cache file. Missing or unreadable files yield an empty list.
pub fn read_wal_colors(path: &Path) -> Vec<Rgb> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_wal_colors(&content),
        Err(e) => {
            warn!("Wal colors file not readable at {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Rgb = Rgb::new(1, 2, 3);
    const B: Rgb = Rgb::new(4, 5, 6);
    const C: Rgb = Rgb::new(7, 8, 9);

    fn abc() -> Palette {
        Palette::new(vec![A, B, C])
    }

    #[test]
    fn test_palette_index() {
        let p = abc();
        assert_eq!(p.resolve(&ColorSpec::parse("color[1]")), B);
        assert_eq!(p.resolve(&ColorSpec::parse("color[9]")), Rgb::BLACK);
    }

    #[test]
    fn test_hex_and_literal() {
        let p = abc();
        assert_eq!(p.resolve(&ColorSpec::parse("#FF0000")), Rgb::RED);
        assert_eq!(p.resolve(&ColorSpec::parse("#FF00")), Rgb::BLACK);
        assert_eq!(p.resolve(&ColorSpec::parse("#ZZZZZZ")), Rgb::BLACK);
        assert_eq!(p.resolve(&ColorSpec::Literal(C)), C);
    }

    #[test]
    fn test_garbage_is_black() {
        let p = abc();
        assert_eq!(p.resolve(&ColorSpec::parse("red")), Rgb::BLACK);
        assert_eq!(p.resolve(&ColorSpec::parse("color[x]")), Rgb::BLACK);
    }

    #[test]
    fn test_from_toml_value() {
        use toml::Value::Integer;

        let v = toml::Value::Array(vec![Integer(10), Integer(20), Integer(30)]);
        assert_eq!(ColorSpec::from(v), ColorSpec::Literal(Rgb::new(10, 20, 30)));

        let v = toml::Value::Array(vec![Integer(1), Integer(2)]);
        assert!(matches!(ColorSpec::from(v), ColorSpec::Invalid(_)));

        let v = toml::Value::Array(vec![Integer(1), Integer(2), Integer(300)]);
        assert!(matches!(ColorSpec::from(v), ColorSpec::Invalid(_)));

        let v = toml::Value::String("color[2]".into());
        assert_eq!(ColorSpec::from(v), ColorSpec::PaletteIndex(2));

        assert!(matches!(
            ColorSpec::from(toml::Value::Boolean(true)),
            ColorSpec::Invalid(_)
        ));
    }

    #[test]
    fn test_deserialize_inside_struct() {
        #[derive(Deserialize)]
        struct Holder {
            color: ColorSpec,
        }
        let h: Holder = toml::from_str(r##"color = "#E0AF68""##).unwrap();
        assert_eq!(h.color, ColorSpec::Hex("#E0AF68".into()));
        let h: Holder = toml::from_str("color = 5").unwrap();
        assert!(matches!(h.color, ColorSpec::Invalid(_)));
    }

    #[test]
    fn test_parse_wal_colors() {
        let colors = parse_wal_colors("#373b43\n\n#ABB2BF\n  #bf616a  \n");
        assert_eq!(
            colors,
            vec![
                Rgb::new(55, 59, 67),
                Rgb::new(171, 178, 191),
                Rgb::new(191, 97, 106)
            ]
        );
    }

    #[test]
    fn test_malformed_wal_line_empties_palette() {
        assert!(parse_wal_colors("#373b43\nnot-a-color\n").is_empty());
        assert!(parse_wal_colors("").is_empty());
    }

    #[test]
    fn test_load_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("colors");
        assert_eq!(Palette::load(true, &missing).len(), 9);
        assert_eq!(Palette::load(false, &missing).len(), 2);

        std::fs::write(&missing, "#010203\n#040506\n").unwrap();
        let p = Palette::load(true, &missing);
        assert_eq!(p.colors(), &[A, B]);
        // Disabled pywal ignores the file entirely
        assert_eq!(Palette::load(false, &missing), Palette::fallback(false));
    }
}
