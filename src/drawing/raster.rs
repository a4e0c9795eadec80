//! Backend-independent primitive rasterization
//!
//! Geometry, clipping and sprite sampling happen here once; a backend only
//! says how to put clipped, palette-indexed pixels on its target.

use super::dpi::{ClipRegion, ScreenRect};
use super::framebuffer::FrameBuffer;
use super::sprite::{ImageId, SpriteCatalog, SpriteElement};
use super::PaletteMap;

/// Where clipped primitives end up
pub(crate) trait IndexedTarget {
    /// Fill a rectangle already clipped to the bound region
    fn fill_rect(&mut self, rect: &ScreenRect, index: u8);

    /// Write a row starting at `(x, y)`; `None` leaves the pixel untouched
    fn write_row(&mut self, x: i32, y: i32, row: &[Option<u8>]);
}

impl IndexedTarget for FrameBuffer {
    fn fill_rect(&mut self, rect: &ScreenRect, index: u8) {
        FrameBuffer::fill_rect(self, rect, index);
    }

    fn write_row(&mut self, x: i32, y: i32, row: &[Option<u8>]) {
        if y < 0 || x < 0 {
            return;
        }
        let Some(dst) = self.row_mut(y as u32) else {
            return;
        };
        let start = (x as usize).min(dst.len());
        for (px, src) in dst[start..].iter_mut().zip(row) {
            if let Some(index) = src {
                *px = *index;
            }
        }
    }
}

pub(crate) fn clear<T: IndexedTarget + ?Sized>(target: &mut T, clip: &ClipRegion, colour: u32) {
    let bounds = clip.bounds();
    if !bounds.is_empty() {
        target.fill_rect(&bounds, (colour & 0xFF) as u8);
    }
}

pub(crate) fn fill_rect<T: IndexedTarget + ?Sized>(
    target: &mut T,
    clip: &ClipRegion,
    colour: u32,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
) {
    if let Some(rect) = clip.clip_rect(left, top, right, bottom) {
        target.fill_rect(&rect, (colour & 0xFF) as u8);
    }
}

fn lookup(catalog: &dyn SpriteCatalog, image: ImageId) -> Option<&SpriteElement> {
    let element = catalog.element(image.index());
    if element.is_none() {
        log::debug!("sprite {} not in catalog, draw skipped", image.index());
    }
    element
}

/// Blit `image` at `(x, y)`, optionally substituting indices through `remap`.
/// Index 0 is transparent. Sprites without pixel data are drawn as a solid
/// rectangle in their placeholder colour.
pub(crate) fn draw_sprite<T: IndexedTarget + ?Sized>(
    target: &mut T,
    clip: &ClipRegion,
    catalog: &dyn SpriteCatalog,
    image: ImageId,
    x: i32,
    y: i32,
    remap: Option<&PaletteMap>,
) {
    let Some(sprite) = lookup(catalog, image) else {
        return;
    };
    if sprite.has_pixels() && !sprite.pixels_match_size() {
        log::debug!("sprite {} pixel data does not match its size, draw skipped", image.index());
        return;
    }
    let left = x.saturating_add(sprite.x_offset);
    let top = y.saturating_add(sprite.y_offset);

    if !sprite.has_pixels() {
        let colour = image.placeholder_colour();
        let colour = remap.map_or(colour, |map| map[colour as usize] as u32);
        fill_rect(
            target,
            clip,
            colour,
            left,
            top,
            left.saturating_add(sprite.width),
            top.saturating_add(sprite.height),
        );
        return;
    }

    let Some(blit) = clip.clip_blit(left, top, sprite.width, sprite.height) else {
        return;
    };
    let width = blit.dst.width() as usize;
    let mut row = Vec::with_capacity(width);
    for dy in 0..blit.dst.height() {
        let src = &sprite.row(blit.src_y + dy)[blit.src_x as usize..][..width];
        row.clear();
        row.extend(src.iter().map(|&index| match index {
            0 => None,
            index => Some(remap.map_or(index, |map| map[index as usize])),
        }));
        target.write_row(blit.dst.left, blit.dst.top + dy, &row);
    }
}

/// Composite `colour_image` through `mask_image`, positioned by the mask's offset
pub(crate) fn draw_sprite_masked<T: IndexedTarget + ?Sized>(
    target: &mut T,
    clip: &ClipRegion,
    catalog: &dyn SpriteCatalog,
    x: i32,
    y: i32,
    mask_image: ImageId,
    colour_image: ImageId,
) {
    let (Some(mask), Some(colour)) = (lookup(catalog, mask_image), lookup(catalog, colour_image))
    else {
        return;
    };
    if !mask.pixels_match_size() || !colour.pixels_match_size() {
        log::debug!(
            "masked draw of {} through {} needs pixel data matching each size, skipped",
            colour_image.index(),
            mask_image.index()
        );
        return;
    }

    let width = mask.width.min(colour.width);
    let height = mask.height.min(colour.height);
    let Some(blit) = clip.clip_blit(
        x.saturating_add(mask.x_offset),
        y.saturating_add(mask.y_offset),
        width,
        height,
    ) else {
        return;
    };

    let width = blit.dst.width() as usize;
    let src_x = blit.src_x as usize;
    let mut row = Vec::with_capacity(width);
    for dy in 0..blit.dst.height() {
        let sy = blit.src_y + dy;
        let mask_row = &mask.row(sy)[src_x..][..width];
        let colour_row = &colour.row(sy)[src_x..][..width];
        row.clear();
        row.extend(
            mask_row
                .iter()
                .zip(colour_row)
                .map(|(&m, &c)| (m != 0).then_some(c)),
        );
        target.write_row(blit.dst.left, blit.dst.top + dy, &row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::sprite::SpriteSheet;

    /// Records what a backend would be asked to draw
    #[derive(Default)]
    struct Recorder {
        rects: Vec<(ScreenRect, u8)>,
        rows: Vec<(i32, i32, Vec<Option<u8>>)>,
    }

    impl IndexedTarget for Recorder {
        fn fill_rect(&mut self, rect: &ScreenRect, index: u8) {
            self.rects.push((*rect, index));
        }

        fn write_row(&mut self, x: i32, y: i32, row: &[Option<u8>]) {
            self.rows.push((x, y, row.to_vec()));
        }
    }

    fn full_clip(width: i32, height: i32) -> ClipRegion {
        ClipRegion {
            right: width,
            bottom: height,
            ..ClipRegion::default()
        }
    }

    #[test]
    fn test_fill_rect_masks_colour() {
        let mut rec = Recorder::default();
        fill_rect(&mut rec, &full_clip(10, 10), 0xABCD_0105, 1, 1, 3, 3);
        assert_eq!(rec.rects, vec![(ScreenRect::new(1, 1, 3, 3), 0x05)]);
    }

    #[test]
    fn test_clear_covers_clip() {
        let mut rec = Recorder::default();
        let clip = ClipRegion {
            left: 4,
            top: 5,
            right: 9,
            bottom: 7,
            offset_x: 4,
            offset_y: 5,
        };
        clear(&mut rec, &clip, 3);
        assert_eq!(rec.rects, vec![(ScreenRect::new(4, 5, 9, 7), 3)]);
    }

    #[test]
    fn test_unknown_sprite_draws_nothing() {
        let mut rec = Recorder::default();
        let sheet = SpriteSheet::new("empty");
        draw_sprite(&mut rec, &full_clip(10, 10), &sheet, ImageId::new(3), 0, 0, None);
        draw_sprite_masked(
            &mut rec,
            &full_clip(10, 10),
            &sheet,
            0,
            0,
            ImageId::new(0),
            ImageId::new(1),
        );
        assert!(rec.rects.is_empty());
        assert!(rec.rows.is_empty());
    }

    #[test]
    fn test_placeholder_sprite_uses_index_low_byte() {
        let mut sheet = SpriteSheet::new("meta");
        for _ in 0..0x102 {
            sheet.push(SpriteElement::new(2, 3, 4, 5));
        }
        let mut rec = Recorder::default();
        draw_sprite(
            &mut rec,
            &full_clip(100, 100),
            &sheet,
            ImageId::new(0x101).with_flags(0x2000_0000),
            10,
            10,
            None,
        );
        assert_eq!(rec.rects, vec![(ScreenRect::new(12, 13, 16, 18), 0x01)]);
    }

    #[test]
    fn test_sprite_rows_skip_transparent_and_remap() {
        let mut sheet = SpriteSheet::new("px");
        let id = sheet.push(SpriteElement::with_pixels(0, 0, 3, 1, vec![1, 0, 2]).unwrap());
        let mut map = crate::drawing::identity_palette_map();
        map[2] = 9;

        let mut rec = Recorder::default();
        draw_sprite(&mut rec, &full_clip(10, 10), &sheet, id, 1, 1, Some(&map));
        assert_eq!(rec.rows, vec![(1, 1, vec![Some(1), None, Some(9)])]);
    }

    #[test]
    fn test_masked_uses_smaller_sprite_and_mask_offset() {
        let mut sheet = SpriteSheet::new("mask");
        let mask = sheet.push(SpriteElement::with_pixels(1, 0, 2, 2, vec![1, 0, 0, 1]).unwrap());
        let colour =
            sheet.push(SpriteElement::with_pixels(50, 50, 3, 1, vec![7, 8, 9]).unwrap());

        let mut rec = Recorder::default();
        draw_sprite_masked(&mut rec, &full_clip(10, 10), &sheet, 0, 0, mask, colour);
        assert_eq!(rec.rows, vec![(1, 0, vec![Some(7), None])]);
    }

    /// Catalog handing out elements built directly, bypassing the size check
    struct RawCatalog(Vec<SpriteElement>);

    impl SpriteCatalog for RawCatalog {
        fn element(&self, index: u32) -> Option<&SpriteElement> {
            self.0.get(index as usize)
        }
    }

    #[test]
    fn test_sprite_with_short_pixel_data_is_skipped() {
        let catalog = RawCatalog(vec![
            SpriteElement {
                x_offset: 0,
                y_offset: 0,
                width: 4,
                height: 4,
                pixels: vec![1],
            },
            SpriteElement::with_pixels(0, 0, 2, 2, vec![1, 1, 1, 1]).unwrap(),
            SpriteElement {
                x_offset: 0,
                y_offset: 0,
                width: -2,
                height: -2,
                pixels: vec![1; 4],
            },
        ]);

        let mut rec = Recorder::default();
        let clip = full_clip(10, 10);
        draw_sprite(&mut rec, &clip, &catalog, ImageId::new(0), 0, 0, None);
        draw_sprite(&mut rec, &clip, &catalog, ImageId::new(2), 5, 5, None);
        draw_sprite_masked(&mut rec, &clip, &catalog, 0, 0, ImageId::new(1), ImageId::new(0));
        draw_sprite_masked(&mut rec, &clip, &catalog, 0, 0, ImageId::new(0), ImageId::new(1));
        assert!(rec.rects.is_empty());
        assert!(rec.rows.is_empty());

        // The well-formed element still draws
        draw_sprite(&mut rec, &clip, &catalog, ImageId::new(1), 0, 0, None);
        assert_eq!(rec.rows.len(), 2);
    }
}
