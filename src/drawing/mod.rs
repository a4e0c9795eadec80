//! Indexed-colour drawing engine and context interfaces
//!
//! A [`DrawingEngine`] owns the framebuffer, the palette and whatever the
//! backend presents through. Each frame the simulation asks it for a
//! [`DrawingContext`] bound to a destination DPI and issues primitives in
//! that destination's coordinate space. A context mutably borrows its engine,
//! so only one can be bound at a time.

mod dpi;
pub mod engines;
mod framebuffer;
pub mod palette;
mod raster;
pub mod sprite;

pub use dpi::{BlitRect, BufferId, ClipRegion, DrawPixelInfo, ScreenRect};
pub use framebuffer::FrameBuffer;
pub use palette::{Colour4f, PaletteEntry, PaletteTable, PALETTE_SIZE};
pub use sprite::{ImageId, SpriteCatalog, SpriteElement, SpriteSheet};

use anyhow::Result;

/// Per-draw index substitution table for recoloured sprites
pub type PaletteMap = [u8; PALETTE_SIZE];

/// Identity substitution
pub fn identity_palette_map() -> PaletteMap {
    let mut map = [0u8; PALETTE_SIZE];
    for (i, slot) in map.iter_mut().enumerate() {
        *slot = i as u8;
    }
    map
}

/// Engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, no presentation context yet
    Uninitialised,
    /// Presentation context acquired
    Initialised,
    /// At least one frame drawn
    Running,
}

/// Primitive draw calls against one bound destination
pub trait DrawingContext {
    type Engine: ?Sized;

    /// Engine this context draws through
    fn engine(&self) -> &Self::Engine;

    /// Clip bounds and offset derived from the bound DPI
    fn clip(&self) -> ClipRegion;

    /// Fill the whole clip rectangle
    fn clear(&mut self, colour: u32);

    /// Fill `[left, right) × [top, bottom)` in either corner order.
    /// Only the low 8 bits of `colour` pick the palette entry.
    fn fill_rect(&mut self, colour: u32, left: i32, top: i32, right: i32, bottom: i32);

    /// Blit a catalog sprite with its top-left at `(x, y)` plus the sprite's offset
    fn draw_sprite(&mut self, image: ImageId, x: i32, y: i32, tertiary_colour: u32);

    /// Blit a sprite with each pixel's index substituted through `palette_map`
    fn draw_sprite_palette_set(
        &mut self,
        image: ImageId,
        x: i32,
        y: i32,
        palette_map: &PaletteMap,
        reserved: Option<&[u8]>,
    );

    /// Draw `colour_image` only where `mask_image` is non-zero
    fn draw_sprite_raw_masked(&mut self, x: i32, y: i32, mask_image: ImageId, colour_image: ImageId);
}

/// Owner of the framebuffer, palette and presentation context
pub trait DrawingEngine {
    /// What `initialise` binds to
    type Surface;

    type Context<'a>: DrawingContext<Engine = Self>
    where
        Self: 'a;

    /// Acquire the presentation context. An error here is fatal to startup.
    fn initialise(&mut self, surface: Self::Surface) -> Result<()>;

    /// Reallocate the framebuffer (pitch = width) and reconfigure output
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn set_palette(&mut self, palette: &[PaletteEntry; PALETTE_SIZE]);

    /// Redraw hint; never required for correct output
    fn invalidate(&mut self, left: i32, top: i32, right: i32, bottom: i32);

    /// Run one frame: clear, project, call back into the simulation, present
    fn draw(&mut self, callbacks: &mut dyn FrameCallbacks<Self>) -> Result<()>
    where
        Self: Sized;

    /// Bind the engine's context to `dpi`.
    ///
    /// # Panics
    /// If `dpi` does not alias this engine's framebuffer.
    fn drawing_context(&mut self, dpi: &DrawPixelInfo) -> Self::Context<'_>;

    /// DPI covering the whole framebuffer, as of the last resize
    fn screen_dpi(&self) -> DrawPixelInfo;

    fn state(&self) -> EngineState;
}

/// Simulation hooks invoked by [`DrawingEngine::draw`], in declaration order
pub trait FrameCallbacks<E: DrawingEngine> {
    /// Redraw everything inside `region` (the whole screen each frame)
    fn redraw_region(&mut self, _engine: &mut E, _region: ScreenRect) {}

    /// Composite window contents and viewports
    fn composite_windows(&mut self, _engine: &mut E) {}

    /// Redraw overlays on top of the windows
    fn draw_overlay(&mut self, _engine: &mut E) {}

    /// Final global draw pass
    fn draw_global(&mut self, _engine: &mut E) {}
}

impl<E: DrawingEngine> FrameCallbacks<E> for () {}

/// Invoke the frame hooks in their fixed order
pub(crate) fn run_frame_callbacks<E: DrawingEngine>(
    engine: &mut E,
    callbacks: &mut dyn FrameCallbacks<E>,
    width: u32,
    height: u32,
) {
    let screen = ScreenRect::new(0, 0, width as i32, height as i32);
    callbacks.redraw_region(engine, screen);
    callbacks.composite_windows(engine);
    callbacks.draw_overlay(engine);
    callbacks.draw_global(engine);
}
