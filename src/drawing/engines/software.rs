//! Software drawing engine
//!
//! Rasterizes straight into the indexed framebuffer. Presenting expands the
//! framebuffer through the palette into an RGBA frame and hands it to a
//! [`PresentationSurface`].

use std::rc::Rc;

use anyhow::{bail, Result};

use crate::drawing::raster;
use crate::drawing::{
    run_frame_callbacks, ClipRegion, DrawPixelInfo, DrawingContext, DrawingEngine, EngineState,
    FrameBuffer, FrameCallbacks, ImageId, PaletteEntry, PaletteMap, PaletteTable, ScreenRect,
    SpriteCatalog, PALETTE_SIZE,
};

/// Receiver of finished frames
pub trait PresentationSurface {
    /// `frame` is `width × height` pixels, 4 bytes each in R, G, B, A order
    fn present(&mut self, frame: &[u8], width: u32, height: u32) -> Result<()>;
}

/// Keeps the last presented frame in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySurface {
    pub frame: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frames_presented: u64,
}

impl MemorySurface {
    /// (r, g, b, a) at (x, y) of the last frame
    pub fn pixel(&self, x: u32, y: u32) -> Option<(u8, u8, u8, u8)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4) as usize;
        let px = self.frame.get(idx..idx + 4)?;
        Some((px[0], px[1], px[2], px[3]))
    }
}

impl PresentationSurface for MemorySurface {
    fn present(&mut self, frame: &[u8], width: u32, height: u32) -> Result<()> {
        self.frame.clear();
        self.frame.extend_from_slice(frame);
        self.width = width;
        self.height = height;
        self.frames_presented += 1;
        Ok(())
    }
}

/// Shared handle so callers can inspect a surface the engine owns
impl<S: PresentationSurface + ?Sized> PresentationSurface for Rc<std::cell::RefCell<S>> {
    fn present(&mut self, frame: &[u8], width: u32, height: u32) -> Result<()> {
        self.borrow_mut().present(frame, width, height)
    }
}

/// CPU rasterizer over the indexed framebuffer
pub struct SoftwareDrawingEngine {
    surface: Option<Box<dyn PresentationSurface>>,
    framebuffer: FrameBuffer,
    palette: PaletteTable,
    clip: ClipRegion,
    catalog: Rc<dyn SpriteCatalog>,
    dirty: Option<ScreenRect>,
    frame: Vec<u8>,
    state: EngineState,
}

impl SoftwareDrawingEngine {
    pub fn new(catalog: Rc<dyn SpriteCatalog>) -> Self {
        Self {
            surface: None,
            framebuffer: FrameBuffer::new(),
            palette: PaletteTable::new(),
            clip: ClipRegion::default(),
            catalog,
            dirty: None,
            frame: Vec::new(),
            state: EngineState::Uninitialised,
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    /// Union of everything invalidated since the last present
    pub fn dirty_rect(&self) -> Option<ScreenRect> {
        self.dirty
    }

    /// Expand the framebuffer through the palette into `self.frame`
    fn expand_frame(&mut self) {
        let width = self.framebuffer.width();
        let height = self.framebuffer.height();
        self.frame.clear();
        self.frame.reserve(width as usize * height as usize * 4);
        for y in 0..height {
            let Some(row) = self.framebuffer.row(y) else {
                continue;
            };
            for &index in row {
                let (r, g, b, a) = self.palette.rgba8(index);
                self.frame.extend_from_slice(&[r, g, b, a]);
            }
        }
    }
}

impl DrawingEngine for SoftwareDrawingEngine {
    type Surface = Box<dyn PresentationSurface>;
    type Context<'a> = SoftwareDrawingContext<'a>;

    fn initialise(&mut self, surface: Self::Surface) -> Result<()> {
        self.surface = Some(surface);
        self.state = EngineState::Initialised;
        log::info!("software drawing engine initialised");
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.framebuffer.resize(width, height, width);
        self.dirty = Some(ScreenRect::new(0, 0, width as i32, height as i32));
        log::info!("software drawing engine resized to {}x{}", width, height);
        Ok(())
    }

    fn set_palette(&mut self, palette: &[PaletteEntry; PALETTE_SIZE]) {
        self.palette.set_palette(palette);
    }

    fn invalidate(&mut self, left: i32, top: i32, right: i32, bottom: i32) {
        let bounds = ScreenRect::new(
            0,
            0,
            self.framebuffer.width() as i32,
            self.framebuffer.height() as i32,
        );
        let rect = ScreenRect {
            left: left.min(right).max(bounds.left),
            top: top.min(bottom).max(bounds.top),
            right: right.max(left).min(bounds.right),
            bottom: bottom.max(top).min(bounds.bottom),
        };
        if rect.is_empty() {
            return;
        }
        self.dirty = Some(self.dirty.map_or(rect, |dirty| dirty.union(&rect)));
    }

    fn draw(&mut self, callbacks: &mut dyn FrameCallbacks<Self>) -> Result<()> {
        if self.surface.is_none() {
            bail!("draw called before initialise");
        }

        let width = self.framebuffer.width();
        let height = self.framebuffer.height();
        run_frame_callbacks(self, callbacks, width, height);

        self.expand_frame();
        if let Some(surface) = self.surface.as_mut() {
            surface.present(&self.frame, width, height)?;
        }
        self.dirty = None;
        if self.state != EngineState::Running {
            log::debug!("software drawing engine running");
            self.state = EngineState::Running;
        }
        Ok(())
    }

    fn drawing_context(&mut self, dpi: &DrawPixelInfo) -> SoftwareDrawingContext<'_> {
        self.clip = ClipRegion::from_dpi(&self.framebuffer.dpi(), dpi);
        SoftwareDrawingContext { engine: self }
    }

    fn screen_dpi(&self) -> DrawPixelInfo {
        self.framebuffer.dpi()
    }

    fn state(&self) -> EngineState {
        self.state
    }
}

/// Context bound to one DPI of a [`SoftwareDrawingEngine`]
pub struct SoftwareDrawingContext<'a> {
    engine: &'a mut SoftwareDrawingEngine,
}

impl DrawingContext for SoftwareDrawingContext<'_> {
    type Engine = SoftwareDrawingEngine;

    fn engine(&self) -> &SoftwareDrawingEngine {
        &*self.engine
    }

    fn clip(&self) -> ClipRegion {
        self.engine.clip
    }

    fn clear(&mut self, colour: u32) {
        let engine = &mut *self.engine;
        raster::clear(&mut engine.framebuffer, &engine.clip, colour);
    }

    fn fill_rect(&mut self, colour: u32, left: i32, top: i32, right: i32, bottom: i32) {
        let engine = &mut *self.engine;
        raster::fill_rect(
            &mut engine.framebuffer,
            &engine.clip,
            colour,
            left,
            top,
            right,
            bottom,
        );
    }

    fn draw_sprite(&mut self, image: ImageId, x: i32, y: i32, _tertiary_colour: u32) {
        let engine = &mut *self.engine;
        raster::draw_sprite(
            &mut engine.framebuffer,
            &engine.clip,
            engine.catalog.as_ref(),
            image,
            x,
            y,
            None,
        );
    }

    fn draw_sprite_palette_set(
        &mut self,
        image: ImageId,
        x: i32,
        y: i32,
        palette_map: &PaletteMap,
        _reserved: Option<&[u8]>,
    ) {
        let engine = &mut *self.engine;
        raster::draw_sprite(
            &mut engine.framebuffer,
            &engine.clip,
            engine.catalog.as_ref(),
            image,
            x,
            y,
            Some(palette_map),
        );
    }

    fn draw_sprite_raw_masked(&mut self, x: i32, y: i32, mask_image: ImageId, colour_image: ImageId) {
        let engine = &mut *self.engine;
        raster::draw_sprite_masked(
            &mut engine.framebuffer,
            &engine.clip,
            engine.catalog.as_ref(),
            x,
            y,
            mask_image,
            colour_image,
        );
    }
}
