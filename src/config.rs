use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "studio.ron";
pub const CONFIG_ENV: &str = "FACILITATE_STUDIO_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Camera defaults, in renderer space (metres).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    pub position: (f32, f32, f32),
    pub target: (f32, f32, f32),
    /// per-frame distances for held keys
    pub pan_speed: f32,
    pub rotate_speed: f32,
    pub smooth_time: f32,
    /// eye offset from an object when focusing on it
    pub focus_offset: (f32, f32, f32),
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: (12.0, 8.0, 12.0),
            target: (0.0, 0.0, 0.0),
            pan_speed: 0.08,
            rotate_speed: 0.02,
            smooth_time: 0.35,
            focus_offset: (5.0, 3.0, 5.0),
            min_distance: 3.0,
            max_distance: 60.0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub camera: CameraSettings,
    pub scale_range: (f64, f64),
    pub scale_step: f64,
    /// upper bound of the height slider, centi-units
    pub height_max: f64,
    pub default_color: [u8; 3],
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            camera: CameraSettings::default(),
            scale_range: (0.1, 3.0),
            scale_step: 0.1,
            height_max: 1000.0,
            default_color: [0x3b, 0x82, 0xf6],
            log_filter: "info".into(),
        }
    }
}

impl EditorConfig {
    /// Settings path: `$FACILITATE_STUDIO_CONFIG`, else `studio.ron` in the
    /// working directory.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn from_ron(path: &Path, text: &str) -> Result<Self, ConfigError> {
        ron::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(path, &text)
    }

    /// Like [`EditorConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let cfg = Self::load(path)?;
        info!(path = %path.display(), "settings loaded");
        Ok(cfg)
    }
}
