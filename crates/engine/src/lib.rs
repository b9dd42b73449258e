use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod camera;
pub mod compositor;
pub mod config;
pub mod content;
pub mod geometry;
pub mod schedule;
pub mod sequence;
pub mod world;

pub use app::{
    run_app, AppError, EngineContext, Game, GameError, Key, LoopConfig, LoopMetricsSnapshot,
};
pub use camera::Camera;
pub use compositor::{
    Cell, Composite, Display, Drawable, GridError, GridLayer, Image, Layer, LayerRef, Rgba, Tile,
    TileId, TRANSPARENT,
};
pub use config::{Settings, SettingsError, SETTINGS_ENV_VAR};
pub use content::{ImageLoadError, ImageLoader, RegistryError, Tag, TagLookup, TileRegistry};
pub use geometry::{Point, Rect, Size, Vec2};
pub use schedule::{ScheduleError, Scheduler, TimerHandle, TimerId};
pub use sequence::{step, ContinuationHandle, Sequencer, Step, StepResult};
pub use world::{
    BlockGrid, CollisionPolicy, GridLayerRef, Map, MapController, SceneError, SceneManager,
    COLLISION_OBJECT,
};

pub const ROOT_ENV_VAR: &str = "FARMSTEAD_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "FARMSTEAD_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/farmstead\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Locates the project root and derives the asset directory from
/// `settings.asset_dir`.
pub fn resolve_app_paths(settings: &Settings) -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets_dir = settings.resolve_asset_dir(&root);
    Ok(AppPaths { root, assets_dir })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_from(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn root_is_found_by_walking_up() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("Cargo.toml"), "[workspace]\n").expect("cargo toml");
        fs::create_dir_all(temp.path().join("assets")).expect("assets");
        let nested = temp.path().join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested");

        let root = find_root_from(&nested).expect("root");
        assert_eq!(root, normalize_path(temp.path()));
    }

    #[test]
    fn asset_dir_follows_settings() {
        let settings = Settings {
            asset_dir: PathBuf::from("art"),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_asset_dir(Path::new("/farm")),
            Path::new("/farm").join("art")
        );
    }
}
