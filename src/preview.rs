//! Terminal preview of a frame using crossterm true-color cells.
//!
//! Cells show a short label when a single-key group (or `numbers`) maps to
//! them, so a config can be checked without touching the keyboard.

use std::collections::BTreeMap;
use std::io::{self, Write};

use crossterm::{
    style::{self, Color, Stylize},
    QueueableCommand,
};

use crate::color::Rgb;
use crate::positions::{Coord, PositionTable, ALL_GROUP, NUMBERS_GROUP};
use crate::rules::Frame;

/// Width of each cell in characters.
const CELL_W: usize = 5;

/// Short labels per coordinate
pub fn build_labels(positions: &PositionTable) -> BTreeMap<Coord, String> {
    let mut labels = BTreeMap::new();
    for (name, coords) in positions.groups() {
        if name == ALL_GROUP {
            continue;
        }
        if name == NUMBERS_GROUP {
            for (i, coord) in coords.iter().enumerate() {
                labels.entry(*coord).or_insert_with(|| (i + 1).to_string());
            }
        } else if let [coord] = coords {
            labels
                .entry(*coord)
                .or_insert_with(|| name.chars().take(CELL_W - 2).collect());
        }
    }
    labels
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}

/// Draw `frame` as a grid of colored cells below a header line.
pub fn print_frame<W: Write>(
    out: &mut W,
    header: &str,
    frame: &Frame,
    labels: &BTreeMap<Coord, String>,
) -> io::Result<()> {
    out.queue(style::PrintStyledContent(
        format!(" {header} ").with(Color::White).on(Color::DarkGrey),
    ))?;
    out.queue(style::Print("\n"))?;

    for (row, cells) in frame.iter_rows().enumerate() {
        for (col, color) in cells.iter().enumerate() {
            let label = labels
                .get(&Coord::new(row, col))
                .map(String::as_str)
                .unwrap_or("");
            let fg = if color.luma() > 128 {
                Color::Black
            } else {
                Color::White
            };
            out.queue(style::PrintStyledContent(
                format!("{label:^CELL_W$}").with(fg).on(to_color(*color)),
            ))?;
        }
        out.queue(style::Print("\n"))?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        let t = PositionTable::with_defaults(6, 22);
        let labels = build_labels(&t);
        assert_eq!(labels.get(&Coord::new(2, 1)).map(String::as_str), Some("q"));
        assert_eq!(labels.get(&Coord::new(1, 3)).map(String::as_str), Some("3"));
        assert_eq!(labels.get(&Coord::new(1, 15)).map(String::as_str), Some("bac"));
        assert!(!labels.contains_key(&Coord::new(0, 0)));
    }

    #[test]
    fn test_print_frame() {
        let t = PositionTable::with_defaults(6, 22);
        let mut frame = Frame::new(6, 22);
        frame.set(Coord::new(2, 1), Rgb::WHITE);
        let mut out = Vec::new();
        print_frame(&mut out, "mode: base", &frame, &build_labels(&t)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("mode: base"));
        assert!(text.contains("  q  "));
        assert_eq!(text.matches('\n').count(), 7);
    }
}
