//! Sprite catalog lookup
//!
//! Draw calls name sprites by an [`ImageId`]: the low 19 bits are the catalog
//! index, the bits above carry render flags (recolour, remap) that the
//! drawing paths here accept but do not interpret.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Packed sprite reference passed to the sprite draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u32);

impl ImageId {
    pub const INDEX_MASK: u32 = 0x7FFFF;

    pub const fn new(index: u32) -> Self {
        Self(index & Self::INDEX_MASK)
    }

    /// Same sprite with flag bits or'ed in above the index
    pub const fn with_flags(self, flags: u32) -> Self {
        Self(self.0 | (flags & !Self::INDEX_MASK))
    }

    /// Catalog index
    #[inline]
    pub const fn index(self) -> u32 {
        self.0 & Self::INDEX_MASK
    }

    /// Everything above the index
    #[inline]
    pub const fn flags(self) -> u32 {
        self.0 & !Self::INDEX_MASK
    }

    /// Colour used when a sprite has no pixel data to blit
    #[inline]
    pub const fn placeholder_colour(self) -> u32 {
        self.index() & 0xFF
    }
}

/// Sprite metadata plus decoded palette-index pixels (row-major, 0 = transparent)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpriteElement {
    pub x_offset: i32,
    pub y_offset: i32,
    pub width: i32,
    pub height: i32,
    /// Empty for metadata-only sprites
    #[serde(default)]
    pub pixels: Vec<u8>,
}

impl SpriteElement {
    /// Metadata-only sprite
    pub fn new(x_offset: i32, y_offset: i32, width: i32, height: i32) -> Self {
        Self {
            x_offset,
            y_offset,
            width,
            height,
            pixels: Vec::new(),
        }
    }

    /// Sprite with pixel data; `None` if `pixels` is not exactly `width × height`
    pub fn with_pixels(
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        pixels: Vec<u8>,
    ) -> Option<Self> {
        if width < 0 || height < 0 || pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            x_offset,
            y_offset,
            width,
            height,
            pixels,
        })
    }

    #[inline]
    pub fn has_pixels(&self) -> bool {
        !self.pixels.is_empty()
    }

    /// Whether `pixels` holds exactly `width × height` entries
    pub fn pixels_match_size(&self) -> bool {
        self.width >= 0
            && self.height >= 0
            && self.pixels.len() == self.width as usize * self.height as usize
    }

    /// Row `y`, or an empty slice for metadata-only sprites
    #[inline]
    pub fn row(&self, y: i32) -> &[u8] {
        let start = (y * self.width) as usize;
        self.pixels
            .get(start..start + self.width as usize)
            .unwrap_or(&[])
    }

    fn validate(&self) -> Result<()> {
        if self.width < 0 || self.height < 0 {
            bail!("negative size {}x{}", self.width, self.height);
        }
        if self.has_pixels() && !self.pixels_match_size() {
            bail!(
                "{} pixels for a {}x{} sprite",
                self.pixels.len(),
                self.width,
                self.height
            );
        }
        Ok(())
    }
}

/// Lookup service the drawing contexts consult for sprite draws
pub trait SpriteCatalog {
    /// Element for a catalog index, `None` if unknown
    fn element(&self, index: u32) -> Option<&SpriteElement>;
}

/// In-memory catalog, addressed by position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub name: String,
    pub elements: Vec<SpriteElement>,
}

impl SpriteSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// Append an element, returning its id
    pub fn push(&mut self, element: SpriteElement) -> ImageId {
        self.elements.push(element);
        ImageId::new((self.elements.len() - 1) as u32)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Save sprite sheet to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing sprites {}", path.display()))
    }

    /// Load sprite sheet from a JSON file, rejecting malformed elements
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading sprites {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("parsing sprites {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let sheet: SpriteSheet = serde_json::from_str(json)?;
        for (index, element) in sheet.elements.iter().enumerate() {
            element
                .validate()
                .with_context(|| format!("sprite {}", index))?;
        }
        Ok(sheet)
    }
}

impl SpriteCatalog for SpriteSheet {
    fn element(&self, index: u32) -> Option<&SpriteElement> {
        self.elements.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_masks_index() {
        let id = ImageId(0xE000_0000 | 0x12345);
        assert_eq!(id.index(), 0x12345);
        assert_eq!(id.flags(), 0xE000_0000);
        assert_eq!(id.placeholder_colour(), 0x45);
    }

    #[test]
    fn test_with_flags_leaves_index_alone() {
        let id = ImageId::new(42).with_flags(0x2000_0000 | 0x7);
        assert_eq!(id.index(), 42);
        assert_eq!(id.flags(), 0x2000_0000);
    }

    #[test]
    fn test_with_pixels_checks_size() {
        assert!(SpriteElement::with_pixels(0, 0, 2, 2, vec![1; 3]).is_none());
        let sprite = SpriteElement::with_pixels(0, 0, 2, 2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(sprite.row(1), &[3, 4]);
    }

    #[test]
    fn test_metadata_only_row_is_empty() {
        let sprite = SpriteElement::new(-4, -2, 8, 8);
        assert!(!sprite.has_pixels());
        assert!(sprite.row(0).is_empty());
    }

    #[test]
    fn test_sheet_lookup() {
        let mut sheet = SpriteSheet::new("test");
        let a = sheet.push(SpriteElement::new(0, 0, 1, 1));
        let b = sheet.push(SpriteElement::new(1, 1, 2, 2));
        assert_eq!(a.index(), 0);
        assert_eq!(sheet.element(b.index()).unwrap().width, 2);
        assert!(sheet.element(2).is_none());
    }

    #[test]
    fn test_from_json_rejects_bad_pixel_count() {
        let json = r#"{"name":"bad","elements":[{"x_offset":0,"y_offset":0,"width":2,"height":2,"pixels":[1,2,3]}]}"#;
        let err = SpriteSheet::from_json(json).unwrap_err();
        assert!(format!("{:#}", err).contains("sprite 0"));
    }

    #[test]
    fn test_json_round_trip_keeps_pixels() {
        let mut sheet = SpriteSheet::new("round");
        sheet.push(SpriteElement::with_pixels(1, 2, 2, 1, vec![5, 0]).unwrap());
        let json = serde_json::to_string(&sheet).unwrap();
        let loaded = SpriteSheet::from_json(&json).unwrap();
        assert_eq!(loaded.elements, sheet.elements);
    }

    #[test]
    fn test_save_then_load() {
        let mut sheet = SpriteSheet::new("disk");
        sheet.push(SpriteElement::with_pixels(-1, 2, 2, 2, vec![1, 0, 0, 3]).unwrap());
        sheet.push(SpriteElement::new(0, 0, 8, 8));

        let path = std::env::temp_dir().join(format!("palette-engine-sprites-{}.json", std::process::id()));
        sheet.save(&path).unwrap();
        let loaded = SpriteSheet::load(&path);
        fs::remove_file(&path).ok();

        let loaded = loaded.unwrap();
        assert_eq!(loaded.name, "disk");
        assert_eq!(loaded.elements, sheet.elements);
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = SpriteSheet::load("/nonexistent/sprites.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/sprites.json"));
    }
}
