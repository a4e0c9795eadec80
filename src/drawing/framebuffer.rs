//! CPU-side indexed-colour framebuffer
//!
//! One byte per pixel, rows `pitch` bytes apart. Resizing reallocates and
//! carries the old image over, so a window resize never shears or loses
//! what was already drawn.

use super::dpi::{BufferId, DrawPixelInfo, ScreenRect};

/// Indexed-colour bitmap owned by a drawing engine
pub struct FrameBuffer {
    bits: Option<Vec<u8>>,
    width: u32,
    height: u32,
    pitch: u32,
    id: BufferId,
    dpi: DrawPixelInfo,
}

impl FrameBuffer {
    /// No storage until the first [`resize`](Self::resize)
    pub fn new() -> Self {
        Self {
            bits: None,
            width: 0,
            height: 0,
            pitch: 0,
            id: BufferId::NONE,
            dpi: DrawPixelInfo::default(),
        }
    }

    /// Reallocate for new dimensions, preserving the overlapping image.
    ///
    /// Anything not copied from the old buffer is zero.
    ///
    /// # Panics
    /// If `pitch < width`.
    pub fn resize(&mut self, width: u32, height: u32, pitch: u32) {
        assert!(pitch >= width, "pitch {} narrower than width {}", pitch, width);

        let new_size = pitch as usize * height as usize;
        let mut new_bits = vec![0u8; new_size];

        if let Some(old_bits) = self.bits.take() {
            if self.pitch == pitch {
                // Same stride: rows still line up byte for byte
                let n = old_bits.len().min(new_size);
                new_bits[..n].copy_from_slice(&old_bits[..n]);
                // Columns past the old width were padding and must not resurface
                if width > self.width && pitch > 0 {
                    let old_width = self.width as usize;
                    let copied_rows = self.height.min(height) as usize;
                    for row in new_bits.chunks_exact_mut(pitch as usize).take(copied_rows) {
                        row[old_width..].fill(0);
                    }
                }
            } else if self.pitch > 0 && pitch > 0 {
                let min_width = self.width.min(width) as usize;
                let min_height = self.height.min(height) as usize;
                let old_pitch = self.pitch as usize;
                let new_pitch = pitch as usize;
                for (dst, src) in new_bits
                    .chunks_exact_mut(new_pitch)
                    .zip(old_bits.chunks(old_pitch))
                    .take(min_height)
                {
                    dst[..min_width].copy_from_slice(&src[..min_width]);
                    dst[min_width..].fill(0);
                }
            }
        }

        self.bits = Some(new_bits);
        self.width = width;
        self.height = height;
        self.pitch = pitch;
        self.id = BufferId::next();
        self.dpi = DrawPixelInfo {
            x: 0,
            y: 0,
            width: width as i32,
            height: height as i32,
            pitch: (pitch - width) as i32,
            buffer: self.id,
            origin: 0,
        };

        log::debug!(
            "framebuffer reallocated: {}x{} pitch {} ({} bytes)",
            width,
            height,
            pitch,
            new_size
        );
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn is_allocated(&self) -> bool {
        self.bits.is_some()
    }

    /// DPI describing the whole framebuffer
    #[inline]
    pub fn dpi(&self) -> DrawPixelInfo {
        self.dpi
    }

    /// Raw storage, `pitch × height` bytes (empty before the first resize)
    pub fn bits(&self) -> &[u8] {
        self.bits.as_deref().unwrap_or(&[])
    }

    /// Visible part of row `y`
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.pitch) as usize;
        self.bits().get(start..start + self.width as usize)
    }

    /// Mutable visible part of row `y`
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y >= self.height {
            return None;
        }
        let start = (y * self.pitch) as usize;
        let width = self.width as usize;
        self.bits
            .as_deref_mut()
            .and_then(|bits| bits.get_mut(start..start + width))
    }

    /// Palette index at (x, y), `None` if out of bounds
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width {
            return None;
        }
        self.row(y).map(|row| row[x as usize])
    }

    /// Fill every visible pixel with one index
    pub fn fill(&mut self, index: u8) {
        for y in 0..self.height {
            if let Some(row) = self.row_mut(y) {
                row.fill(index);
            }
        }
    }

    /// Fill `rect` (right/bottom exclusive), clamped to the buffer
    pub fn fill_rect(&mut self, rect: &ScreenRect, index: u8) {
        let rect = ScreenRect {
            left: rect.left.max(0),
            top: rect.top.max(0),
            right: rect.right.min(self.width as i32),
            bottom: rect.bottom.min(self.height as i32),
        };
        if rect.is_empty() {
            return;
        }
        let (left, right) = (rect.left as usize, rect.right as usize);
        for y in rect.top..rect.bottom {
            if let Some(row) = self.row_mut(y as u32) {
                row[left..right].fill(index);
            }
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Paint a deterministic, non-zero pattern over the visible area
    fn paint(fb: &mut FrameBuffer) {
        for y in 0..fb.height() {
            let row = fb.row_mut(y).unwrap();
            for (x, px) in row.iter_mut().enumerate() {
                *px = ((x as u32 * 7 + y * 13) % 255 + 1) as u8;
            }
        }
    }

    #[test]
    fn test_first_resize_is_zeroed() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.is_allocated());
        fb.resize(32, 16, 40);
        assert_eq!(fb.bits().len(), 40 * 16);
        assert!(fb.bits().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_grow_preserves_overlap_and_zeroes_new_area() {
        let mut fb = FrameBuffer::new();
        fb.resize(800, 600, 800);
        paint(&mut fb);
        let before = fb.pixel(10, 10).unwrap();
        assert_ne!(before, 0);

        fb.resize(1024, 768, 1024);
        assert_eq!(fb.pixel(10, 10), Some(before));
        assert_eq!(fb.pixel(900, 10), Some(0));
        assert_eq!(fb.pixel(10, 700), Some(0));
    }

    #[test]
    fn test_resize_sequence_preserves_overlap() {
        let mut fb = FrameBuffer::new();
        fb.resize(64, 48, 64);
        paint(&mut fb);
        let snapshot: Vec<Vec<u8>> = (0..48).map(|y| fb.row(y).unwrap().to_vec()).collect();

        for &(w, h, p) in &[(40, 60, 40), (40, 30, 48), (90, 20, 96), (100, 100, 100)] {
            fb.resize(w, h, p);
        }

        // Overlap of every size in the sequence is 40x20
        for y in 0..100u32 {
            for x in 0..100u32 {
                let px = fb.pixel(x, y).unwrap();
                if x < 40 && y < 20 {
                    assert_eq!(px, snapshot[y as usize][x as usize], "({}, {})", x, y);
                } else {
                    assert_eq!(px, 0, "stale pixel at ({}, {})", x, y);
                }
            }
        }
    }

    #[test]
    fn test_stride_change_copies_row_by_row() {
        let mut fb = FrameBuffer::new();
        fb.resize(4, 3, 4);
        for y in 0..3 {
            fb.row_mut(y).unwrap().copy_from_slice(&[1 + y as u8; 4]);
        }

        fb.resize(6, 3, 8);
        assert_eq!(fb.row(0).unwrap(), &[1, 1, 1, 1, 0, 0]);
        assert_eq!(fb.row(1).unwrap(), &[2, 2, 2, 2, 0, 0]);
        assert_eq!(fb.row(2).unwrap(), &[3, 3, 3, 3, 0, 0]);
        // Padding past the width is zero too
        assert!(fb.bits()[6..8].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_same_pitch_regrow_zeroes_old_padding() {
        let mut fb = FrameBuffer::new();
        fb.resize(100, 4, 128);
        fb.fill(7);
        fb.resize(50, 4, 128);
        fb.resize(100, 4, 128);

        for y in 0..4 {
            let row = fb.row(y).unwrap();
            assert!(row[..50].iter().all(|&b| b == 7), "row {}", y);
            assert!(row[50..].iter().all(|&b| b == 0), "row {}", y);
        }
        assert_eq!(fb.pixel(80, 0), Some(0));
    }

    #[test]
    fn test_shrink_same_pitch() {
        let mut fb = FrameBuffer::new();
        fb.resize(16, 16, 16);
        paint(&mut fb);
        let corner = fb.pixel(3, 3);
        fb.resize(16, 4, 16);
        assert_eq!(fb.bits().len(), 64);
        assert_eq!(fb.pixel(3, 3), corner);
        assert_eq!(fb.pixel(3, 4), None);
    }

    #[test]
    fn test_resize_publishes_screen_dpi() {
        let mut fb = FrameBuffer::new();
        fb.resize(100, 50, 128);
        let first = fb.dpi();
        assert_eq!((first.x, first.y), (0, 0));
        assert_eq!((first.width, first.height), (100, 50));
        assert_eq!(first.pitch, 28);
        assert_eq!(first.origin, 0);
        assert_eq!(first.buffer, fb.id());

        fb.resize(100, 50, 128);
        assert_ne!(fb.dpi().buffer, first.buffer);
    }

    #[test]
    #[should_panic(expected = "narrower than width")]
    fn test_pitch_below_width_panics() {
        FrameBuffer::new().resize(10, 10, 8);
    }

    #[test]
    fn test_fill_rect_stays_inside_rect() {
        let mut fb = FrameBuffer::new();
        fb.resize(8, 8, 8);
        fb.fill_rect(&ScreenRect::new(2, 3, 5, 4), 9);
        let painted = fb.bits().iter().filter(|&&b| b == 9).count();
        assert_eq!(painted, 3);
        assert_eq!(fb.pixel(2, 3), Some(9));
        assert_eq!(fb.pixel(5, 3), Some(0));
    }
}
