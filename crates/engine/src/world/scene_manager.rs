use std::collections::HashMap;

use thiserror::Error;
use tracing::info;

use crate::camera::Camera;
use crate::compositor::Display;
use crate::content::TagLookup;
use crate::geometry::Size;

use super::{CollisionPolicy, Map, MapController};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("no map registered under `{key}`")]
    UnknownMap { key: String },
}

/// Caches one [`MapController`] per map key and owns the camera of the
/// active map.
#[derive(Debug)]
pub struct SceneManager {
    viewport_size: Size,
    policy: CollisionPolicy,
    controllers: HashMap<String, MapController>,
    current: Option<String>,
    camera: Option<Camera>,
}

impl SceneManager {
    pub fn new(viewport_size: Size) -> Self {
        Self {
            viewport_size,
            policy: CollisionPolicy::default(),
            controllers: HashMap::new(),
            current: None,
            camera: None,
        }
    }

    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the controller for `map` and derives its collision grid.
    /// A map already registered under the same key is kept and `map` is
    /// dropped, so repeated visits preserve map state.
    pub fn load_map(&mut self, map: Map, tags: &dyn TagLookup) -> &mut MapController {
        let policy = self.policy;
        self.controllers
            .entry(map.key().to_string())
            .or_insert_with(|| {
                let mut controller = MapController::with_policy(map, policy);
                controller.refresh_block_grid(tags);
                controller
            })
    }

    pub fn contains_map(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    /// Makes the map under `key` current: swaps its layers into the display,
    /// builds a camera for it and letterboxes it when smaller than the view.
    pub fn change_map(&mut self, key: &str, display: &mut Display) -> Result<(), SceneError> {
        if !self.controllers.contains_key(key) {
            return Err(SceneError::UnknownMap {
                key: key.to_string(),
            });
        }

        if let Some(previous) = self.current.take() {
            if let Some(controller) = self.controllers.get(&previous) {
                controller.detach_from_display(display);
            }
        }

        let controller = self
            .controllers
            .get(key)
            .ok_or_else(|| SceneError::UnknownMap {
                key: key.to_string(),
            })?;
        controller.attach_to_display(display);

        let camera = Camera::new(self.viewport_size, controller.map().pixel_size());
        controller.set_offset(camera.letterbox_offset());
        controller.set_crop(Some(camera.viewport_rect()));

        info!(
            map = key,
            world_width = camera.world_size().width,
            world_height = camera.world_size().height,
            "scene_map_changed"
        );
        self.camera = Some(camera);
        self.current = Some(key.to_string());
        Ok(())
    }

    /// Pushes the camera's clamped view into the current map's layers.
    pub fn update_scene(&mut self) {
        let (Some(camera), Some(controller)) = (self.camera.as_ref(), self.controller()) else {
            return;
        };
        controller.set_crop(Some(camera.viewport_rect()));
    }

    pub fn is_map(&self, key: &str) -> bool {
        self.current.as_deref() == Some(key)
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn controller(&self) -> Option<&MapController> {
        self.current
            .as_ref()
            .and_then(|key| self.controllers.get(key))
    }

    pub fn controller_mut(&mut self) -> Option<&mut MapController> {
        let key = self.current.as_ref()?;
        self.controllers.get_mut(key)
    }

    pub fn map_controller(&self, key: &str) -> Option<&MapController> {
        self.controllers.get(key)
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }
}
