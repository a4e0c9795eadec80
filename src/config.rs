//! Engine configuration
//!
//! Settings load from an optional JSON file; command-line flags override
//! whatever the file says.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Which engine presents the frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Palette-coloured primitives on an OpenGL context
    #[default]
    #[value(name = "opengl")]
    OpenGl,
    /// CPU rasterizer, frames uploaded as textures
    Software,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    /// Lock presentation to the display refresh
    pub vsync: bool,
    pub backend: Backend,
    /// JSON palette (256 entries); built-in palette if absent
    pub palette: Option<PathBuf>,
    /// JSON sprite sheet; built-in sprites if absent
    pub sprites: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            vsync: true,
            backend: Backend::default(),
            palette: None,
            sprites: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&json)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("resolution must be non-zero, got {}x{}", self.width, self.height);
        }
        Ok(())
    }
}

/// Command-line options for the demo
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "palette-demo")]
#[command(about = "Indexed-colour drawing engine demo", long_about = None)]
pub struct Cli {
    /// JSON config file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Window width
    #[arg(long, short = 'W')]
    pub width: Option<u32>,

    /// Window height
    #[arg(long, short = 'H')]
    pub height: Option<u32>,

    /// Resolution as WxH (e.g., 1024x768)
    #[arg(long, short = 'r', value_parser = parse_resolution)]
    pub resolution: Option<(u32, u32)>,

    /// Disable VSync for uncapped framerate
    #[arg(long)]
    pub no_vsync: bool,

    /// Presentation backend
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Palette JSON file
    #[arg(long)]
    pub palette: Option<PathBuf>,

    /// Sprite sheet JSON file
    #[arg(long)]
    pub sprites: Option<PathBuf>,
}

impl Cli {
    /// File settings (or defaults) with command-line overrides applied
    pub fn resolve(&self) -> Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };

        if let Some((w, h)) = self.resolution {
            config.width = w;
            config.height = h;
        }
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(h) = self.height {
            config.height = h;
        }
        if self.no_vsync {
            config.vsync = false;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if self.palette.is_some() {
            config.palette.clone_from(&self.palette);
        }
        if self.sprites.is_some() {
            config.sprites.clone_from(&self.sprites);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parse `WxH` (e.g., 1920x1080)
pub fn parse_resolution(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{}'", s))?;
    let w = w.trim().parse::<u32>().map_err(|e| format!("width: {}", e))?;
    let h = h.trim().parse::<u32>().map_err(|e| format!("height: {}", e))?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        assert_eq!(parse_resolution("1920x1080"), Ok((1920, 1080)));
        assert_eq!(parse_resolution("800X600"), Ok((800, 600)));
        assert!(parse_resolution("800").is_err());
        assert!(parse_resolution("wide x 600").is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"width": 1024}"#).unwrap();
        assert_eq!(config.width, 1024);
        assert_eq!(config.height, DEFAULT_HEIGHT);
        assert!(config.vsync);
        assert_eq!(config.backend, Backend::OpenGl);
    }

    #[test]
    fn test_backend_names() {
        let config: EngineConfig = serde_json::from_str(r#"{"backend": "software"}"#).unwrap();
        assert_eq!(config.backend, Backend::Software);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "palette-demo",
            "--resolution",
            "1024x768",
            "--height",
            "700",
            "--no-vsync",
            "--backend",
            "software",
        ]);
        let config = cli.resolve().unwrap();
        assert_eq!((config.width, config.height), (1024, 700));
        assert!(!config.vsync);
        assert_eq!(config.backend, Backend::Software);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        let cli = Cli {
            width: Some(0),
            ..Cli::default()
        };
        assert!(cli.resolve().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("palette-engine-config-{}.json", std::process::id()));
        fs::write(&path, r#"{"width": 320, "height": 200, "vsync": false}"#).unwrap();
        let config = EngineConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!((config.width, config.height, config.vsync), (320, 200, false));
    }
}
