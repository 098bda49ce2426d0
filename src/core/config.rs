use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Main configuration, loaded from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub input: InputConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: u32,
    pub height: u32,
    /// Extent of the world-unit coordinate system mapped onto the window.
    pub world_units: [f32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// FPS limit; `0` disables the limit and renders as fast as possible.
    pub fps_cap: u32,
    pub vsync: bool,
    pub clear_color: [f32; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Camera pan speed in world units per second.
    pub pan_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub show_fps: bool,
    /// How many times the demo scene re-draws its stress string per frame.
    pub stress_draws: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            graphics: GraphicsConfig::default(),
            input: InputConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            world_units: [160.0, 90.0],
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            fps_cap: 0,
            vsync: false,
            clear_color: [0.3, 0.2, 0.6],
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self { pan_speed: 100.0 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            show_fps: true,
            stress_draws: 200,
        }
    }
}

impl AppConfig {
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config at {}", path.display()))?;
            let cfg: AppConfig = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config {}", path.display()))?;
            Ok(cfg)
        } else {
            let cfg = AppConfig::default();
            cfg.write_to(path)?;
            Ok(cfg)
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(&path, serialized)
            .with_context(|| format!("failed to write config to {}", path.as_ref().display()))
    }

    pub fn target_frame_time(&self) -> Option<Duration> {
        if self.graphics.fps_cap == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.graphics.fps_cap as f64))
        }
    }

    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.graphics.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}
