use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use sdl2::keyboard::Keycode;

use palette_engine::config::{Backend, Cli, EngineConfig};
use palette_engine::demo::{demo_sprites, DemoScene};
use palette_engine::display::{Display, InputEvent, MouseButtonKind, WindowSurface};
use palette_engine::drawing::palette::{load_palette, presets};
use palette_engine::drawing::{DrawingEngine, PaletteEntry, SpriteCatalog, SpriteSheet, PALETTE_SIZE};
use palette_engine::{OpenGlDrawingEngine, SoftwareDrawingEngine};

/// Frames between frame-count log lines
const LOG_INTERVAL: u32 = 600;

fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().resolve()?;
    let sprites = match &config.sprites {
        Some(path) => SpriteSheet::load(path)?,
        None => demo_sprites(),
    };
    let palette = match &config.palette {
        Some(path) => load_palette(path)?,
        None => presets::rainbow(),
    };
    log::info!(
        "{}x{}, {:?} backend, vsync {}, {} sprites",
        config.width,
        config.height,
        config.backend,
        config.vsync,
        sprites.len()
    );
    let catalog: Rc<dyn SpriteCatalog> = Rc::new(sprites);

    let mut display = Display::new()?;
    let window = display.create_window("palette-engine", config.width, config.height)?;

    match config.backend {
        Backend::OpenGl => {
            let mut engine = OpenGlDrawingEngine::new(catalog, config.vsync);
            engine
                .initialise(window)
                .context("OpenGL drawing engine failed to start")?;
            run(&mut display, &mut engine, &config, &palette)
        },
        Backend::Software => {
            let surface = WindowSurface::new(window, config.vsync)?;
            let mut engine = SoftwareDrawingEngine::new(catalog);
            engine.initialise(Box::new(surface))?;
            run(&mut display, &mut engine, &config, &palette)
        },
    }
}

fn run<E: DrawingEngine>(
    display: &mut Display,
    engine: &mut E,
    config: &EngineConfig,
    palette: &[PaletteEntry; PALETTE_SIZE],
) -> Result<()> {
    engine.resize(config.width, config.height)?;
    engine.set_palette(palette);

    let mut scene = DemoScene::new();
    let mut grayscale = false;

    'main: loop {
        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(Keycode::P) => {
                    grayscale = !grayscale;
                    if grayscale {
                        engine.set_palette(&presets::grayscale());
                    } else {
                        engine.set_palette(palette);
                    }
                },
                InputEvent::KeyDown(_) => {},
                InputEvent::Resized { width, height } => engine.resize(width, height)?,
                InputEvent::MouseMove { x, y } => scene.mouse = (x, y),
                InputEvent::MouseDown {
                    x,
                    y,
                    button: MouseButtonKind::Left,
                } => {
                    let old = scene.window_rect();
                    scene.window = (x, y);
                    let new = scene.window_rect();
                    engine.invalidate(old.left, old.top, old.right, old.bottom);
                    engine.invalidate(new.left, new.top, new.right, new.bottom);
                },
                InputEvent::MouseDown { .. } => {},
            }
        }

        engine.draw(&mut scene)?;
        if scene.frame() % LOG_INTERVAL == 0 {
            log::trace!("{} frames drawn", scene.frame());
        }
    }

    log::info!("exiting after {} frames", scene.frame());
    Ok(())
}
