use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use super::keys::{validate_asset_key, AssetKeyError};
use crate::compositor::{Image, Tile, TileId};

/// Label attached to tiles, e.g. `COLLISION_OBJECT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub &'static str);

impl Tag {
    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Read side of the registry, as needed by collision derivation.
pub trait TagLookup {
    fn has_tag(&self, tile: TileId, tag: Tag) -> bool;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("tile key `{key}` is invalid: {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("tile key `{key}` is already registered as tile {existing:?}")]
    DuplicateKey { key: String, existing: TileId },
    #[error("tile {0:?} is not registered")]
    UnknownTile(TileId),
}

#[derive(Debug)]
struct TileEntry {
    key: String,
    tile: Tile,
    tags: Vec<Tag>,
}

/// Owns every registered tile. Ids are dense and assigned in registration
/// order.
#[derive(Debug, Default)]
pub struct TileRegistry {
    entries: Vec<TileEntry>,
    ids_by_key: HashMap<String, TileId>,
}

impl TileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: &str, image: Image) -> Result<Tile, RegistryError> {
        validate_asset_key(key).map_err(|source| RegistryError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        if let Some(&existing) = self.ids_by_key.get(key) {
            return Err(RegistryError::DuplicateKey {
                key: key.to_string(),
                existing,
            });
        }

        let id = TileId(self.entries.len() as u32);
        let tile = Tile::new(id, Rc::new(image));
        self.entries.push(TileEntry {
            key: key.to_string(),
            tile: tile.clone(),
            tags: Vec::new(),
        });
        self.ids_by_key.insert(key.to_string(), id);
        debug!(tile_key = key, tile_id = id.0, "tile_registered");
        Ok(tile)
    }

    /// Binding the same tag twice is a no-op.
    pub fn bind_tag(&mut self, tile: TileId, tag: Tag) -> Result<(), RegistryError> {
        let entry = self
            .entries
            .get_mut(tile.0 as usize)
            .ok_or(RegistryError::UnknownTile(tile))?;
        if !entry.tags.contains(&tag) {
            entry.tags.push(tag);
        }
        Ok(())
    }

    pub fn bind_tags(
        &mut self,
        tiles: impl IntoIterator<Item = TileId>,
        tag: Tag,
    ) -> Result<(), RegistryError> {
        tiles
            .into_iter()
            .try_for_each(|tile| self.bind_tag(tile, tag))
    }

    pub fn tags_of(&self, tile: TileId) -> &[Tag] {
        self.entries
            .get(tile.0 as usize)
            .map(|entry| entry.tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.entries.get(id.0 as usize).map(|entry| &entry.tile)
    }

    pub fn tile_by_key(&self, key: &str) -> Option<&Tile> {
        self.ids_by_key.get(key).and_then(|id| self.tile(*id))
    }

    pub fn key_of(&self, id: TileId) -> Option<&str> {
        self.entries
            .get(id.0 as usize)
            .map(|entry| entry.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TagLookup for TileRegistry {
    fn has_tag(&self, tile: TileId, tag: Tag) -> bool {
        self.tags_of(tile).contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;

    const SOLID: Tag = Tag("COLLISION_OBJECT");
    const ARABLE: Tag = Tag("ARABLE");

    fn image() -> Image {
        Image::new(Size::new(1, 1))
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut registry = TileRegistry::new();
        let grass = registry.register("grass/0", image()).expect("grass");
        let fence = registry.register("fence/3", image()).expect("fence");

        assert_eq!(grass.id(), TileId(0));
        assert_eq!(fence.id(), TileId(1));
        let fence_id = registry.tile_by_key("fence/3").map(Tile::id);
        assert_eq!(fence_id, Some(TileId(1)));
        assert_eq!(registry.key_of(TileId(0)), Some("grass/0"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut registry = TileRegistry::new();
        registry.register("grass/0", image()).expect("first");

        let err = registry
            .register("grass/0", image())
            .expect_err("duplicate should fail");

        assert!(matches!(
            err,
            RegistryError::DuplicateKey { existing: TileId(0), .. }
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn invalid_key_is_rejected() {
        let mut registry = TileRegistry::new();
        let err = registry
            .register("../escape", image())
            .expect_err("traversal should fail");
        assert!(matches!(
            err,
            RegistryError::InvalidKey {
                source: AssetKeyError::ParentTraversal,
                ..
            }
        ));
    }

    #[test]
    fn tags_bind_once_and_are_queryable() {
        let mut registry = TileRegistry::new();
        let fence = registry.register("fence/0", image()).expect("fence");
        let dirt = registry.register("dirt/0", image()).expect("dirt");

        registry.bind_tag(fence.id(), SOLID).expect("bind");
        registry.bind_tag(fence.id(), SOLID).expect("rebind");
        registry.bind_tag(dirt.id(), ARABLE).expect("bind");

        assert_eq!(registry.tags_of(fence.id()), &[SOLID]);
        assert!(registry.has_tag(fence.id(), SOLID));
        assert!(!registry.has_tag(dirt.id(), SOLID));
        assert!(registry.has_tag(dirt.id(), ARABLE));
    }

    #[test]
    fn unknown_tile_has_no_tags_and_cannot_be_tagged() {
        let mut registry = TileRegistry::new();
        assert!(registry.tags_of(TileId(9)).is_empty());
        assert!(matches!(
            registry.bind_tag(TileId(9), SOLID),
            Err(RegistryError::UnknownTile(TileId(9)))
        ));
    }
}
