//! 256-entry palette table
//!
//! Pixels in the framebuffer are palette indices; the table maps each index
//! to a normalized RGBA colour the backends can hand to the GPU directly.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Number of entries in a palette
pub const PALETTE_SIZE: usize = 256;

/// One palette colour as supplied by the caller (8 bits per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl PaletteEntry {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Normalized RGBA colour, each channel in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Colour4f {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colour4f {
    #[inline]
    fn from_entry(entry: PaletteEntry) -> Self {
        Self {
            r: entry.r as f32 / 255.0,
            g: entry.g as f32 / 255.0,
            b: entry.b as f32 / 255.0,
            a: entry.a as f32 / 255.0,
        }
    }

    /// Back to 8-bit channels (rounded), in (r, g, b, a) order
    #[inline]
    pub fn to_rgba8(self) -> (u8, u8, u8, u8) {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        (q(self.r), q(self.g), q(self.b), q(self.a))
    }
}

/// The engine's active palette
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteTable {
    colours: [Colour4f; PALETTE_SIZE],
}

impl PaletteTable {
    /// All-black, fully transparent table (what an engine starts with)
    pub fn new() -> Self {
        Self {
            colours: [Colour4f::default(); PALETTE_SIZE],
        }
    }

    /// Replace every entry. Not incremental: the previous table is discarded.
    pub fn set_palette(&mut self, entries: &[PaletteEntry; PALETTE_SIZE]) {
        for (slot, entry) in self.colours.iter_mut().zip(entries.iter()) {
            *slot = Colour4f::from_entry(*entry);
        }
    }

    /// Colour for a draw-call colour value. Only the low 8 bits select the entry.
    #[inline]
    pub fn colour(&self, colour: u32) -> Colour4f {
        self.colours[(colour & 0xFF) as usize]
    }

    #[inline]
    pub fn rgba8(&self, index: u8) -> (u8, u8, u8, u8) {
        self.colour(u32::from(index)).to_rgba8()
    }
}

impl Default for PaletteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a palette from a JSON array of exactly 256 `{r, g, b[, a]}` objects
pub fn load_palette(path: impl AsRef<Path>) -> Result<[PaletteEntry; PALETTE_SIZE]> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading palette {}", path.display()))?;
    parse_palette(&json).with_context(|| format!("parsing palette {}", path.display()))
}

pub fn parse_palette(json: &str) -> Result<[PaletteEntry; PALETTE_SIZE]> {
    let entries: Vec<PaletteEntry> = serde_json::from_str(json)?;
    if entries.len() != PALETTE_SIZE {
        bail!(
            "palette must have {} entries, found {}",
            PALETTE_SIZE,
            entries.len()
        );
    }
    let mut palette = [PaletteEntry::default(); PALETTE_SIZE];
    palette.copy_from_slice(&entries);
    Ok(palette)
}

/// Ready-made palettes for demos and tests
pub mod presets {
    use super::{PaletteEntry, PALETTE_SIZE};

    /// HSV to RGB color conversion
    /// h: 0-360, s: 0-1, v: 0-1
    pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
        let c = v * s;
        let h_prime = h / 60.0;
        let x = c * (1.0 - ((h_prime % 2.0) - 1.0).abs());
        let m = v - c;

        let (r1, g1, b1) = match h_prime as i32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        (
            ((r1 + m) * 255.0) as u8,
            ((g1 + m) * 255.0) as u8,
            ((b1 + m) * 255.0) as u8,
        )
    }

    /// Index 0 black, the rest a hue sweep
    pub fn rainbow() -> [PaletteEntry; PALETTE_SIZE] {
        let mut palette = [PaletteEntry::rgb(0, 0, 0); PALETTE_SIZE];
        for (i, entry) in palette.iter_mut().enumerate().skip(1) {
            let t = i as f32 / PALETTE_SIZE as f32;
            let (r, g, b) = hsv_to_rgb(t * 360.0, 0.8, 0.9);
            *entry = PaletteEntry::rgb(r, g, b);
        }
        palette
    }

    pub fn grayscale() -> [PaletteEntry; PALETTE_SIZE] {
        let mut palette = [PaletteEntry::default(); PALETTE_SIZE];
        for (i, entry) in palette.iter_mut().enumerate() {
            *entry = PaletteEntry::rgb(i as u8, i as u8, i as u8);
        }
        palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_palette_normalizes_channels() {
        let mut entries = [PaletteEntry::default(); PALETTE_SIZE];
        entries[5] = PaletteEntry::rgba(255, 0, 51, 255);
        let mut table = PaletteTable::new();
        table.set_palette(&entries);

        let c = table.colour(5);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_set_palette_idempotent() {
        let entries = presets::rainbow();
        let mut once = PaletteTable::new();
        once.set_palette(&entries);
        let mut twice = PaletteTable::new();
        twice.set_palette(&entries);
        twice.set_palette(&entries);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_set_palette_replaces_everything() {
        let mut table = PaletteTable::new();
        table.set_palette(&presets::rainbow());
        table.set_palette(&presets::grayscale());
        assert_eq!(table.rgba8(200), (200, 200, 200, 255));
    }

    #[test]
    fn test_colour_masks_high_bits() {
        let mut table = PaletteTable::new();
        table.set_palette(&presets::grayscale());
        assert_eq!(table.colour(0x1234_0007), table.colour(7));
    }

    #[test]
    fn test_parse_palette_requires_256_entries() {
        assert!(parse_palette(r#"[{"r":1,"g":2,"b":3}]"#).is_err());

        let json = serde_json::to_string(&vec![PaletteEntry::rgb(9, 8, 7); 256]).unwrap();
        let palette = parse_palette(&json).unwrap();
        assert_eq!(palette[255], PaletteEntry::rgb(9, 8, 7));
    }

    #[test]
    fn test_alpha_defaults_to_opaque() {
        let json = format!("[{}]", vec![r#"{"r":0,"g":0,"b":0}"#; 256].join(","));
        let palette = parse_palette(&json).unwrap();
        assert_eq!(palette[0].a, 255);
    }

    #[test]
    fn test_rgba8_reads_normalized_table() {
        let mut entries = [PaletteEntry::default(); PALETTE_SIZE];
        entries[9] = PaletteEntry::rgba(12, 34, 56, 78);
        let mut table = PaletteTable::new();
        table.set_palette(&entries);
        assert_eq!(table.rgba8(9), (12, 34, 56, 78));
        assert_eq!(table.rgba8(9), table.colour(0xFF09).to_rgba8());
    }
}
