//! Indexed-colour drawing engine
//!
//! A simulation draws palette indices onto a logical framebuffer through a
//! [`drawing::DrawingContext`]; an interchangeable [`drawing::DrawingEngine`]
//! backend presents the result. The software engine is always available;
//! the OpenGL engine and the SDL2 window provider need the `opengl` feature.

pub mod config;
pub mod demo;
#[cfg(feature = "opengl")]
pub mod display;
pub mod drawing;

pub use drawing::engines::{MemorySurface, PresentationSurface, SoftwareDrawingEngine};
#[cfg(feature = "opengl")]
pub use drawing::engines::OpenGlDrawingEngine;
pub use drawing::{
    ClipRegion, DrawPixelInfo, DrawingContext, DrawingEngine, EngineState, FrameCallbacks,
    ImageId, PaletteEntry, ScreenRect, SpriteCatalog, SpriteElement, SpriteSheet,
};
