use std::process::ExitCode;

use farmstead_engine::{resolve_app_paths, run_app, Game, LoopConfig, Settings};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use super::farm::FarmGame;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) game: Box<dyn Game>,
}

pub(crate) fn build_app() -> Result<AppWiring, ExitCode> {
    init_tracing();
    info!("=== Farmstead Startup ===");

    let settings = Settings::load_from_env().map_err(|err| {
        error!(error = %err, "settings_load_failed");
        ExitCode::FAILURE
    })?;
    let paths = resolve_app_paths(&settings).map_err(|err| {
        error!(error = %err, "startup_failed");
        ExitCode::FAILURE
    })?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        "startup"
    );

    Ok(AppWiring {
        config: LoopConfig {
            settings,
            asset_root: paths.assets_dir,
        },
        game: Box::new(FarmGame::new()),
    })
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_app(app.config, app.game) {
        error!(error = %err, "app_run_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
