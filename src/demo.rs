//! Demo scene driven through the frame callbacks
//!
//! Exercises every primitive against whatever engine it is handed: colour
//! bars over the whole screen, a clipped window with plain and recoloured
//! sprites, a masked sprite following the mouse and a placeholder sprite.

use crate::drawing::{
    identity_palette_map, DrawingContext, DrawingEngine, FrameCallbacks, ImageId, PaletteMap,
    ScreenRect, SpriteElement, SpriteSheet,
};

/// Catalog positions the scene draws
pub const CHECKER_SPRITE: ImageId = ImageId::new(0);
pub const CIRCLE_MASK_SPRITE: ImageId = ImageId::new(1);
pub const GRADIENT_SPRITE: ImageId = ImageId::new(2);
pub const MARKER_SPRITE: ImageId = ImageId::new(3);

const BAR_COUNT: i32 = 16;
const WINDOW_WIDTH: i32 = 160;
const WINDOW_HEIGHT: i32 = 120;
const WINDOW_BACKGROUND: u32 = 0xF0;

/// Built-in sprites, laid out at the positions above
pub fn demo_sprites() -> SpriteSheet {
    let mut sheet = SpriteSheet::new("demo");

    let checker: Vec<u8> = (0..16 * 16i32)
        .map(|i| {
            let (x, y) = (i % 16, i / 16);
            if (x / 4 + y / 4) % 2 == 0 {
                0x20
            } else {
                0x60
            }
        })
        .collect();
    let mask: Vec<u8> = (0..24 * 24i32)
        .map(|i| {
            let (dx, dy) = (i % 24 - 12, i / 24 - 12);
            u8::from(dx * dx + dy * dy <= 144)
        })
        .collect();
    let gradient: Vec<u8> = (0..24 * 24i32).map(|i| 1 + (i % 24) as u8 * 10).collect();

    let sprites = [
        SpriteElement::with_pixels(0, 0, 16, 16, checker),
        SpriteElement::with_pixels(-12, -12, 24, 24, mask),
        SpriteElement::with_pixels(0, 0, 24, 24, gradient),
    ];
    for sprite in sprites.into_iter().flatten() {
        sheet.push(sprite);
    }
    sheet.push(SpriteElement::new(-2, -2, 4, 4));
    sheet
}

/// Simulation side of the demo
pub struct DemoScene {
    pub mouse: (i32, i32),
    /// Logical top-left of the demo window
    pub window: (i32, i32),
    frame: u32,
    recolour: PaletteMap,
}

impl DemoScene {
    pub fn new() -> Self {
        let mut recolour = identity_palette_map();
        recolour[0x20] = 0x90;
        recolour[0x60] = 0xC0;
        Self {
            mouse: (0, 0),
            window: (40, 40),
            frame: 0,
            recolour,
        }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Screen area the window covers, for invalidation when it moves
    pub fn window_rect(&self) -> ScreenRect {
        ScreenRect::new(
            self.window.0,
            self.window.1,
            self.window.0 + WINDOW_WIDTH,
            self.window.1 + WINDOW_HEIGHT,
        )
    }
}

impl Default for DemoScene {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DrawingEngine> FrameCallbacks<E> for DemoScene {
    fn redraw_region(&mut self, engine: &mut E, region: ScreenRect) {
        let screen = engine.screen_dpi();
        let mut ctx = engine.drawing_context(&screen);
        let bar_width = (region.width() / BAR_COUNT).max(1);
        for i in 0..BAR_COUNT {
            let colour = 1 + (i as u32 * 15 + self.frame) % 254;
            let left = region.left + i * bar_width;
            // Corners given bottom-right first on purpose
            ctx.fill_rect(colour, left + bar_width, region.bottom, left, region.top);
        }
    }

    fn composite_windows(&mut self, engine: &mut E) {
        let (x, y) = self.window;
        let Some(window) = engine
            .screen_dpi()
            .sub_region(x, y, WINDOW_WIDTH, WINDOW_HEIGHT)
        else {
            return;
        };
        let mut ctx = engine.drawing_context(&window);
        ctx.clear(WINDOW_BACKGROUND);
        ctx.draw_sprite(CHECKER_SPRITE, 8, 8, 0);
        ctx.draw_sprite_palette_set(CHECKER_SPRITE, 32, 8, &self.recolour, None);
        // Partly outside the window, clipped by it
        ctx.draw_sprite(GRADIENT_SPRITE, WINDOW_WIDTH - 12, WINDOW_HEIGHT - 12, 0);
    }

    fn draw_overlay(&mut self, engine: &mut E) {
        let screen = engine.screen_dpi();
        let mut ctx = engine.drawing_context(&screen);
        ctx.draw_sprite_raw_masked(self.mouse.0, self.mouse.1, CIRCLE_MASK_SPRITE, GRADIENT_SPRITE);
    }

    fn draw_global(&mut self, engine: &mut E) {
        let screen = engine.screen_dpi();
        let mut ctx = engine.drawing_context(&screen);
        ctx.draw_sprite(MARKER_SPRITE, self.mouse.0, self.mouse.1, 0);
        self.frame = self.frame.wrapping_add(1);
    }
}
