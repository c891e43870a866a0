//! Configuration: where zmeview keeps its files, and the persisted viewer settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment override for the config directory
pub const CONFIG_DIR_ENV: &str = "ZMEVIEW_CONFIG_DIR";

/// Files whose presence in the working directory makes it the config directory
const LOCAL_FILES: [&str; 2] = ["zmeview.json", "zmeview.log"];

/// Overrides for the default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg → `ZMEVIEW_CONFIG_DIR` → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

/// Path of a configuration or log file.
///
/// Priority:
/// 1. `--config-dir`
/// 2. `ZMEVIEW_CONFIG_DIR`
/// 3. Current directory, if it already holds zmeview.json or zmeview.log
/// 4. Platform config directory (`~/.config/zmeview` on Linux)
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

/// Create the config directory if needed
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let dir = config_dir(config);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    LOCAL_FILES.iter().any(|f| dir.join(f).exists())
}

fn config_dir(config: &PathConfig) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = dirs_next::config_dir() {
        return dir.join("zmeview");
    }

    PathBuf::from(".")
}

/// Playback rate in frames per second
pub const DEFAULT_FPS: f32 = 28.0;
/// Cap for fast-forward/reverse doubling (frames per tick)
pub const DEFAULT_MAX_SPEED: i32 = 128;

pub const ZOOM_MIN: f32 = 1.0;
pub const ZOOM_MAX: f32 = 3.0;
pub const ZOOM_STEP: f32 = 0.5;

/// Persisted viewer settings (stored by eframe as JSON)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Timer rate for play and fast motion
    pub fps: f32,
    pub max_speed: i32,
    pub zoom: f32,
    pub show_help: bool,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            max_speed: DEFAULT_MAX_SPEED,
            zoom: ZOOM_MIN,
            show_help: false,
        }
    }
}

impl ViewerSettings {
    /// Timer period; non-positive or absurd rates fall back to the default
    pub fn frame_period(&self) -> Duration {
        let fps = if self.fps.is_finite() && self.fps >= 1.0 && self.fps <= 240.0 {
            self.fps
        } else {
            DEFAULT_FPS
        };
        Duration::from_secs_f32(1.0 / fps)
    }

    /// Clamp values that came from an older or hand-edited settings file
    pub fn sanitized(mut self) -> Self {
        if !(self.fps.is_finite() && self.fps >= 1.0 && self.fps <= 240.0) {
            self.fps = DEFAULT_FPS;
        }
        self.max_speed = self.max_speed.clamp(2, 1 << 16);
        self.zoom = if self.zoom.is_finite() {
            ((self.zoom / ZOOM_STEP).round() * ZOOM_STEP).clamp(ZOOM_MIN, ZOOM_MAX)
        } else {
            ZOOM_MIN
        };
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: ViewerSettings =
            serde_json::from_str(json).context("Failed to parse viewer settings")?;
        Ok(settings.sanitized())
    }
}
