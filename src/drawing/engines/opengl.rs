//! OpenGL drawing engine
//!
//! Draw calls go straight to an SDL2 renderer pinned to its `opengl` driver:
//! filled rectangles become quads and sprite rows become runs of one-pixel
//! high quads in the palette colour. The framebuffer store still tracks the
//! screen geometry that DPIs are derived from.

use std::rc::Rc;

use anyhow::{anyhow, bail, Result};
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use sdl2::render::{BlendMode, Canvas};
use sdl2::video::Window;

use crate::drawing::raster::{self, IndexedTarget};
use crate::drawing::{
    run_frame_callbacks, ClipRegion, DrawPixelInfo, DrawingContext, DrawingEngine, EngineState,
    FrameBuffer, FrameCallbacks, ImageId, PaletteEntry, PaletteMap, PaletteTable, ScreenRect,
    SpriteCatalog, PALETTE_SIZE,
};

/// Name SDL reports for its OpenGL render driver
const OPENGL_DRIVER: &str = "opengl";

/// Engine presenting through an OpenGL context on an SDL2 window
pub struct OpenGlDrawingEngine {
    canvas: Option<Canvas<Window>>,
    framebuffer: FrameBuffer,
    palette: PaletteTable,
    clip: ClipRegion,
    catalog: Rc<dyn SpriteCatalog>,
    vsync: bool,
    state: EngineState,
}

impl OpenGlDrawingEngine {
    pub fn new(catalog: Rc<dyn SpriteCatalog>, vsync: bool) -> Self {
        Self {
            canvas: None,
            framebuffer: FrameBuffer::new(),
            palette: PaletteTable::new(),
            clip: ClipRegion::default(),
            catalog,
            vsync,
            state: EngineState::Uninitialised,
        }
    }

    pub fn palette(&self) -> &PaletteTable {
        &self.palette
    }

    /// Viewport and 1:1 pixel projection for the current size
    fn configure_projection(&mut self) {
        let width = self.framebuffer.width().max(1);
        let height = self.framebuffer.height().max(1);
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.set_viewport(Rect::new(0, 0, width, height));
            if let Err(e) = canvas.set_scale(1.0, 1.0) {
                log::warn!("resetting render scale failed: {}", e);
            }
        }
    }
}

impl DrawingEngine for OpenGlDrawingEngine {
    type Surface = Window;
    type Context<'a> = OpenGlDrawingContext<'a>;

    fn initialise(&mut self, window: Window) -> Result<()> {
        let driver = sdl2::render::drivers()
            .position(|info| info.name == OPENGL_DRIVER)
            .ok_or_else(|| anyhow!("no OpenGL render driver available"))?;

        let mut builder = window.into_canvas().index(driver as u32).accelerated();
        if self.vsync {
            builder = builder.present_vsync();
        }
        let mut canvas = builder
            .build()
            .map_err(|e| anyhow!("creating OpenGL context: {}", e))?;
        canvas.set_blend_mode(BlendMode::None);

        let info = canvas.info();
        log::info!(
            "OpenGL drawing engine initialised (driver {}, vsync {})",
            info.name,
            self.vsync
        );

        self.canvas = Some(canvas);
        self.state = EngineState::Initialised;
        self.configure_projection();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.framebuffer.resize(width, height, width);
        self.configure_projection();
        log::info!("OpenGL drawing engine resized to {}x{}", width, height);
        Ok(())
    }

    fn set_palette(&mut self, palette: &[PaletteEntry; PALETTE_SIZE]) {
        self.palette.set_palette(palette);
    }

    fn invalidate(&mut self, _left: i32, _top: i32, _right: i32, _bottom: i32) {
        // Every frame redraws the whole surface
    }

    fn draw(&mut self, callbacks: &mut dyn FrameCallbacks<Self>) -> Result<()> {
        let Some(canvas) = self.canvas.as_mut() else {
            bail!("draw called before initialise");
        };
        canvas.set_draw_color(Color::RGBA(0, 0, 0, 0));
        canvas.clear();
        self.configure_projection();

        let width = self.framebuffer.width();
        let height = self.framebuffer.height();
        run_frame_callbacks(self, callbacks, width, height);

        if let Some(canvas) = self.canvas.as_mut() {
            canvas.present();
        }
        if self.state != EngineState::Running {
            log::debug!("OpenGL drawing engine running");
            self.state = EngineState::Running;
        }
        Ok(())
    }

    fn drawing_context(&mut self, dpi: &DrawPixelInfo) -> OpenGlDrawingContext<'_> {
        self.clip = ClipRegion::from_dpi(&self.framebuffer.dpi(), dpi);
        OpenGlDrawingContext { engine: self }
    }

    fn screen_dpi(&self) -> DrawPixelInfo {
        self.framebuffer.dpi()
    }

    fn state(&self) -> EngineState {
        self.state
    }
}

/// Rasterizes indexed primitives as palette-coloured quads
struct QuadTarget<'a> {
    canvas: &'a mut Canvas<Window>,
    palette: &'a PaletteTable,
}

impl QuadTarget<'_> {
    fn set_colour(&mut self, index: u8) {
        let (r, g, b, _) = self.palette.colour(u32::from(index)).to_rgba8();
        self.canvas.set_draw_color(Color::RGB(r, g, b));
    }

    fn quad(&mut self, left: i32, top: i32, width: u32, height: u32) {
        if let Err(e) = self.canvas.fill_rect(Rect::new(left, top, width, height)) {
            log::warn!("fill_rect failed: {}", e);
        }
    }
}

impl IndexedTarget for QuadTarget<'_> {
    fn fill_rect(&mut self, rect: &ScreenRect, index: u8) {
        if rect.is_empty() {
            return;
        }
        self.set_colour(index);
        self.quad(rect.left, rect.top, rect.width() as u32, rect.height() as u32);
    }

    fn write_row(&mut self, x: i32, y: i32, row: &[Option<u8>]) {
        // One quad per run of equal indices
        let mut start = 0;
        while start < row.len() {
            let Some(index) = row[start] else {
                start += 1;
                continue;
            };
            let run = row[start..]
                .iter()
                .take_while(|px| **px == Some(index))
                .count();
            self.set_colour(index);
            self.quad(x + start as i32, y, run as u32, 1);
            start += run;
        }
    }
}

/// Context bound to one DPI of an [`OpenGlDrawingEngine`]
pub struct OpenGlDrawingContext<'a> {
    engine: &'a mut OpenGlDrawingEngine,
}

impl OpenGlDrawingContext<'_> {
    /// Split the engine into a raster target plus the state the raster helpers read.
    /// `None` until the engine has a canvas.
    fn parts(&mut self) -> Option<(QuadTarget<'_>, &ClipRegion, &dyn SpriteCatalog)> {
        let engine = &mut *self.engine;
        let canvas = engine.canvas.as_mut()?;
        Some((
            QuadTarget {
                canvas,
                palette: &engine.palette,
            },
            &engine.clip,
            engine.catalog.as_ref(),
        ))
    }
}

impl DrawingContext for OpenGlDrawingContext<'_> {
    type Engine = OpenGlDrawingEngine;

    fn engine(&self) -> &OpenGlDrawingEngine {
        &*self.engine
    }

    fn clip(&self) -> ClipRegion {
        self.engine.clip
    }

    fn clear(&mut self, colour: u32) {
        if let Some((mut target, clip, _)) = self.parts() {
            raster::clear(&mut target, clip, colour);
        }
    }

    fn fill_rect(&mut self, colour: u32, left: i32, top: i32, right: i32, bottom: i32) {
        if let Some((mut target, clip, _)) = self.parts() {
            raster::fill_rect(&mut target, clip, colour, left, top, right, bottom);
        }
    }

    fn draw_sprite(&mut self, image: ImageId, x: i32, y: i32, _tertiary_colour: u32) {
        if let Some((mut target, clip, catalog)) = self.parts() {
            raster::draw_sprite(&mut target, clip, catalog, image, x, y, None);
        }
    }

    fn draw_sprite_palette_set(
        &mut self,
        image: ImageId,
        x: i32,
        y: i32,
        palette_map: &PaletteMap,
        _reserved: Option<&[u8]>,
    ) {
        if let Some((mut target, clip, catalog)) = self.parts() {
            raster::draw_sprite(&mut target, clip, catalog, image, x, y, Some(palette_map));
        }
    }

    fn draw_sprite_raw_masked(&mut self, x: i32, y: i32, mask_image: ImageId, colour_image: ImageId) {
        if let Some((mut target, clip, catalog)) = self.parts() {
            raster::draw_sprite_masked(&mut target, clip, catalog, x, y, mask_image, colour_image);
        }
    }
}
