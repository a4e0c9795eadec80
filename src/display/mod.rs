//! SDL2 window provider
//!
//! Opens the OpenGL-capable window the engines present to, turns SDL events
//! into [`InputEvent`]s (including the resize events that drive
//! `DrawingEngine::resize`), and offers a [`WindowSurface`] so the software
//! engine can present into a window too.

use anyhow::{anyhow, Result};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::mouse::MouseButton;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::{EventPump, Sdl, VideoSubsystem};

use crate::drawing::engines::PresentationSurface;

pub struct Display {
    _sdl: Sdl,
    video: VideoSubsystem,
    event_pump: EventPump,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
    /// Window client area changed size
    Resized {
        width: u32,
        height: u32,
    },
    MouseMove {
        x: i32,
        y: i32,
    },
    MouseDown {
        x: i32,
        y: i32,
        button: MouseButtonKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonKind {
    Left,
    Right,
    Middle,
}

impl Display {
    pub fn new() -> Result<Self> {
        let sdl = sdl2::init().map_err(|e| anyhow!("initialising SDL: {}", e))?;
        let video = sdl.video().map_err(|e| anyhow!("initialising video: {}", e))?;
        let event_pump = sdl.event_pump().map_err(|e| anyhow!("event pump: {}", e))?;
        Ok(Self {
            _sdl: sdl,
            video,
            event_pump,
        })
    }

    /// Resizable, OpenGL-capable window for an engine to initialise against
    pub fn create_window(&self, title: &str, width: u32, height: u32) -> Result<Window> {
        self.video
            .window(title, width, height)
            .position_centered()
            .resizable()
            .opengl()
            .build()
            .map_err(|e| anyhow!("creating window: {}", e))
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                Event::Window {
                    win_event: WindowEvent::SizeChanged(w, h),
                    ..
                } => events.push(InputEvent::Resized {
                    width: w.max(1) as u32,
                    height: h.max(1) as u32,
                }),
                Event::MouseMotion { x, y, .. } => events.push(InputEvent::MouseMove { x, y }),
                Event::MouseButtonDown {
                    x, y, mouse_btn, ..
                } => {
                    if let Some(button) = map_mouse_button(mouse_btn) {
                        events.push(InputEvent::MouseDown { x, y, button });
                    }
                },
                _ => {},
            }
        }

        events
    }
}

fn map_mouse_button(btn: MouseButton) -> Option<MouseButtonKind> {
    match btn {
        MouseButton::Left => Some(MouseButtonKind::Left),
        MouseButton::Right => Some(MouseButtonKind::Right),
        MouseButton::Middle => Some(MouseButtonKind::Middle),
        _ => None,
    }
}

/// Presents software-rendered frames into a window through a streaming texture
pub struct WindowSurface {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
}

impl WindowSurface {
    pub fn new(window: Window, vsync: bool) -> Result<Self> {
        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder
            .build()
            .map_err(|e| anyhow!("creating window canvas: {}", e))?;
        let texture_creator = canvas.texture_creator();
        Ok(Self {
            canvas,
            texture_creator,
        })
    }
}

impl PresentationSurface for WindowSurface {
    fn present(&mut self, frame: &[u8], width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        // ABGR8888 is R, G, B, A in memory on little-endian targets.
        // The texture borrows the creator, so it lives for one frame.
        let mut texture = self
            .texture_creator
            .create_texture_streaming(PixelFormatEnum::ABGR8888, width, height)
            .map_err(|e| anyhow!("creating frame texture: {}", e))?;
        texture
            .update(None, frame, (width * 4) as usize)
            .map_err(|e| anyhow!("uploading frame: {}", e))?;

        self.canvas
            .copy(&texture, None, None)
            .map_err(|e| anyhow!("copying frame: {}", e))?;
        self.canvas.present();
        Ok(())
    }
}
