use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::compositor::Rgba;
use crate::geometry::Size;

pub const SETTINGS_ENV_VAR: &str = "FARMSTEAD_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings at `{field_path}`: {source}")]
    Parse {
        field_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Construction-time engine settings. Every field has a default, so a
/// settings file only needs to name what it overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub window_title: String,
    /// Render frame cap in frames per second; 0 renders uncapped.
    pub refresh_rate: u32,
    /// Size of one grid cell in display pixels.
    pub cell_size: Size,
    /// Number of cells visible on screen.
    pub grid_size: Size,
    /// Window pixels per display pixel.
    pub scale_factor: u32,
    pub background: Rgba,
    pub max_frame_delta_ms: u64,
    pub metrics_log_interval_ms: u64,
    /// Asset directory, relative to the project root unless absolute.
    pub asset_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_title: "Farmstead".to_string(),
            refresh_rate: 60,
            cell_size: Size::new(16, 16),
            grid_size: Size::new(32, 24),
            scale_factor: 2,
            background: [255, 255, 255, 255],
            max_frame_delta_ms: 250,
            metrics_log_interval_ms: 1000,
            asset_dir: PathBuf::from("assets"),
        }
    }
}

impl Settings {
    pub fn from_json_str(raw: &str) -> Result<Self, SettingsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let settings: Settings = serde_path_to_error::deserialize(&mut deserializer).map_err(
            |error| {
                let field_path = error.path().to_string();
                SettingsError::Parse {
                    field_path,
                    source: error.into_inner(),
                }
            },
        )?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json_str(&raw)?;
        info!(path = %path.display(), "settings_loaded");
        Ok(settings)
    }

    /// Loads the file named by `FARMSTEAD_SETTINGS`, or returns defaults
    /// when the variable is unset.
    pub fn load_from_env() -> Result<Self, SettingsError> {
        match env::var(SETTINGS_ENV_VAR) {
            Ok(value) => Self::load(Path::new(&value)),
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(source) => Err(SettingsError::EnvVar {
                var: SETTINGS_ENV_VAR,
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cell_size.is_empty() {
            return Err(SettingsError::Invalid {
                field: "cell_size",
                reason: "width and height must be positive",
            });
        }
        if self.grid_size.is_empty() {
            return Err(SettingsError::Invalid {
                field: "grid_size",
                reason: "width and height must be positive",
            });
        }
        if self.scale_factor == 0 {
            return Err(SettingsError::Invalid {
                field: "scale_factor",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Size of the composited frame.
    pub fn display_size(&self) -> Size {
        self.grid_size.scaled_by(self.cell_size)
    }

    pub fn window_size(&self) -> Size {
        let display = self.display_size();
        Size::new(
            display.width.saturating_mul(self.scale_factor),
            display.height.saturating_mul(self.scale_factor),
        )
    }

    pub fn render_fps_cap(&self) -> Option<u32> {
        Some(self.refresh_rate).filter(|rate| *rate > 0)
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_millis(self.max_frame_delta_ms)
    }

    pub fn metrics_log_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_log_interval_ms)
    }

    pub fn resolve_asset_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.asset_dir)
    }
}
