use farmstead_engine::{GridError, RegistryError, SceneError, ScheduleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum FarmError {
    #[error("failed to parse farm data at `{path}`: {source}")]
    Data {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("map `{map}` references unknown layer `{layer}`")]
    UnknownLayer { map: String, layer: String },
    #[error("map `{map}` references unknown tile `{tile}`")]
    UnknownTile { map: String, tile: String },
    #[error("no map named `{map}` in farm data")]
    UnknownMap { map: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
