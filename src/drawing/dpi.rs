//! Draw pixel info (DPI) descriptors and clip/offset derivation
//!
//! A DPI is a value view into the framebuffer: a logical origin label
//! (`x`, `y`), a size, the excess stride past its width, and the absolute
//! byte offset of its first pixel inside the buffer it aliases. Windows carve
//! DPIs out of the screen DPI with [`DrawPixelInfo::sub_region`]; a drawing
//! context recovers clip bounds and offset from one with
//! [`ClipRegion::from_dpi`].

use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one framebuffer allocation. Every reallocation gets a new id,
/// so DPIs taken before a resize stop aliasing the live buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(u64);

impl BufferId {
    /// Id carried by DPIs that alias nothing (before the first resize)
    pub const NONE: BufferId = BufferId(0);

    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        BufferId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Rectangle in absolute framebuffer coordinates, right/bottom exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right <= self.left || self.bottom <= self.top
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &ScreenRect) -> ScreenRect {
        ScreenRect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}

/// A rectangular view into a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawPixelInfo {
    /// Logical x of the view's first column
    pub x: i32,
    /// Logical y of the view's first row
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Bytes between the end of one row and the start of the next
    pub pitch: i32,
    /// Allocation this view aliases
    pub buffer: BufferId,
    /// Byte offset of the first pixel within the buffer
    pub origin: usize,
}

impl DrawPixelInfo {
    /// Bytes from the start of one row to the start of the next
    #[inline]
    pub fn row_stride(&self) -> i32 {
        self.width + self.pitch
    }

    /// Clip this view to the logical rectangle `(x, y, width, height)`.
    ///
    /// The child keeps aliasing the same buffer; its origin and pitch are
    /// advanced past whatever was clipped away on the left and top, and its
    /// logical origin is re-expressed relative to `(x, y)`. Returns `None`
    /// when nothing of the requested rectangle is visible.
    pub fn sub_region(&self, x: i32, y: i32, width: i32, height: i32) -> Option<DrawPixelInfo> {
        let right = x + width;
        let bottom = y + height;
        let mut dst = *self;

        if x > dst.x {
            let clipped = x - dst.x;
            dst.width -= clipped;
            dst.x = x;
            dst.pitch += clipped;
            dst.origin = dst.origin.checked_add_signed(clipped as isize)?;
        }

        let stick_out = dst.x + dst.width - right;
        if stick_out > 0 {
            dst.width -= stick_out;
            dst.pitch += stick_out;
        }

        if y > dst.y {
            let clipped = y - dst.y;
            dst.height -= clipped;
            dst.y = y;
            let skipped = (dst.pitch + dst.width) as isize * clipped as isize;
            dst.origin = dst.origin.checked_add_signed(skipped)?;
        }

        let stick_out = dst.y + dst.height - bottom;
        if stick_out > 0 {
            dst.height -= stick_out;
        }

        if dst.width > 0 && dst.height > 0 {
            dst.x -= x;
            dst.y -= y;
            Some(dst)
        } else {
            None
        }
    }
}

/// Clip bounds and coordinate offset of a bound drawing context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClipRegion {
    pub offset_x: i32,
    pub offset_y: i32,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Where a `width × height` source image lands after clipping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlitRect {
    /// Visible destination, absolute framebuffer coordinates
    pub dst: ScreenRect,
    /// Source column that lands on `dst.left`
    pub src_x: i32,
    /// Source row that lands on `dst.top`
    pub src_y: i32,
}

impl ClipRegion {
    /// Derive clip bounds and offset for `dpi` relative to the full-screen `screen` DPI.
    ///
    /// # Panics
    /// If `dpi` does not alias the same allocation as `screen`, or its origin
    /// lies outside the screen's `height × row_stride` bytes.
    pub fn from_dpi(screen: &DrawPixelInfo, dpi: &DrawPixelInfo) -> Self {
        assert_eq!(
            dpi.buffer, screen.buffer,
            "DPI does not alias the engine framebuffer"
        );
        let row_stride = screen.row_stride() as usize;
        let bits_size = screen.height.max(0) as usize * row_stride;
        let bits_offset = dpi
            .origin
            .checked_sub(screen.origin)
            .filter(|offset| *offset < bits_size);
        let Some(bits_offset) = bits_offset else {
            panic!(
                "DPI origin {} outside framebuffer ({} bytes from {})",
                dpi.origin, bits_size, screen.origin
            );
        };

        let left = (bits_offset % row_stride) as i32;
        let top = (bits_offset / row_stride) as i32;
        Self {
            left,
            top,
            right: left + dpi.width,
            bottom: top + dpi.height,
            offset_x: left - dpi.x,
            offset_y: top - dpi.y,
        }
    }

    #[inline]
    pub fn bounds(&self) -> ScreenRect {
        ScreenRect::new(self.left, self.top, self.right, self.bottom)
    }

    /// Normalize corner order, translate into framebuffer space and clip.
    /// `None` when nothing is left to draw.
    pub fn clip_rect(&self, left: i32, top: i32, right: i32, bottom: i32) -> Option<ScreenRect> {
        let (left, right) = if left > right { (right, left) } else { (left, right) };
        let (top, bottom) = if top > bottom { (bottom, top) } else { (top, bottom) };

        let rect = ScreenRect {
            left: left.saturating_add(self.offset_x).max(self.left),
            top: top.saturating_add(self.offset_y).max(self.top),
            right: right.saturating_add(self.offset_x).min(self.right),
            bottom: bottom.saturating_add(self.offset_y).min(self.bottom),
        };

        if rect.is_empty() {
            None
        } else {
            Some(rect)
        }
    }

    /// Place a `width × height` image with its top-left at logical `(x, y)`
    pub fn clip_blit(&self, x: i32, y: i32, width: i32, height: i32) -> Option<BlitRect> {
        let left = x.saturating_add(self.offset_x);
        let top = y.saturating_add(self.offset_y);
        let dst = ScreenRect {
            left: left.max(self.left),
            top: top.max(self.top),
            right: left.saturating_add(width).min(self.right),
            bottom: top.saturating_add(height).min(self.bottom),
        };

        if dst.is_empty() {
            return None;
        }
        Some(BlitRect {
            dst,
            src_x: dst.left - left,
            src_y: dst.top - top,
        })
    }
}
