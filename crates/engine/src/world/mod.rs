//! Maps, their collision grids and the scene switching between them.

mod block_grid;
mod controller;
mod map;
mod scene_manager;

pub use block_grid::BlockGrid;
pub use controller::{CollisionPolicy, MapController, COLLISION_OBJECT};
pub use map::{GridLayerRef, Map};
pub use scene_manager::{SceneError, SceneManager};
