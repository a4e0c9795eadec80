//! Backend implementations of the engine/context pair

#[cfg(feature = "opengl")]
mod opengl;
mod software;

#[cfg(feature = "opengl")]
pub use opengl::{OpenGlDrawingContext, OpenGlDrawingEngine};
pub use software::{
    MemorySurface, PresentationSurface, SoftwareDrawingContext, SoftwareDrawingEngine,
};
