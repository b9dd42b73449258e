use std::collections::HashMap;
use std::rc::Rc;

use farmstead_engine::{
    Drawable, Image, ImageLoadError, ImageLoader, Size, Tag, TagLookup, Tile, TileId, TileRegistry,
    COLLISION_OBJECT,
};
use tracing::{debug, info, warn};

use super::art::{self, FramePainter, Painter};
use super::error::FarmError;

/// Bare soil that can be tilled.
pub(crate) const ARABLE: Tag = Tag("ARABLE");
/// Tilled soil that accepts seeds.
pub(crate) const SOWABLE: Tag = Tag("SOWABLE");
pub(crate) const HARVESTABLE: Tag = Tag("HARVESTABLE");
pub(crate) const BED: Tag = Tag("BED");
/// Animations that cycle forever on a map timer.
pub(crate) const LOOPING: Tag = Tag("LOOPING");

struct TileSpec {
    key: &'static str,
    tags: &'static [Tag],
    paint: Painter,
}

struct AnimationSpec {
    key: &'static str,
    frames: u32,
    tags: &'static [Tag],
    paint: FramePainter,
}

const TILES: &[TileSpec] = &[
    tile("grass", &[], art::grass),
    tile("dirt", &[ARABLE], art::dirt),
    tile("tilled", &[SOWABLE], art::tilled),
    tile("path", &[], art::path),
    tile("fence", &[COLLISION_OBJECT], art::fence),
    tile("tree", &[COLLISION_OBJECT], art::tree),
    tile("wall", &[COLLISION_OBJECT], art::wall),
    tile("roof", &[], art::roof),
    tile("wood_floor", &[], art::wood_floor),
    tile("bed", &[COLLISION_OBJECT, BED], art::bed),
    tile("table", &[COLLISION_OBJECT], art::table),
    tile("sprout", &[], art::sprout),
    tile("crop", &[HARVESTABLE], art::crop),
];

const ANIMATIONS: &[AnimationSpec] = &[
    animation("water", 3, &[COLLISION_OBJECT, LOOPING], art::water),
    animation("door", 4, &[COLLISION_OBJECT], art::door),
];

const fn tile(key: &'static str, tags: &'static [Tag], paint: Painter) -> TileSpec {
    TileSpec { key, tags, paint }
}

const fn animation(
    key: &'static str,
    frames: u32,
    tags: &'static [Tag],
    paint: FramePainter,
) -> AnimationSpec {
    AnimationSpec {
        key,
        frames,
        tags,
        paint,
    }
}

/// Every tile the farm uses, registered once with its tags.
#[derive(Debug)]
pub(crate) struct FarmTiles {
    registry: TileRegistry,
    animations: HashMap<&'static str, Rc<[Tile]>>,
    cell_size: Size,
}

impl FarmTiles {
    pub(crate) fn load(loader: &ImageLoader, cell_size: Size) -> Result<Self, FarmError> {
        let mut registry = TileRegistry::new();
        for entry in TILES {
            let image = tile_image(loader, entry.key, cell_size, || (entry.paint)(cell_size));
            let tile = registry.register(entry.key, image)?;
            bind(&mut registry, &tile, entry.tags)?;
        }

        let mut animations = HashMap::new();
        for entry in ANIMATIONS {
            let mut frames = Vec::with_capacity(entry.frames as usize);
            for frame in 0..entry.frames {
                let key = format!("{}/{frame}", entry.key);
                let image = tile_image(loader, &key, cell_size, || {
                    (entry.paint)(cell_size, frame, entry.frames)
                });
                let tile = registry.register(&key, image)?;
                bind(&mut registry, &tile, entry.tags)?;
                frames.push(tile);
            }
            animations.insert(entry.key, Rc::from(frames));
        }

        info!(
            tiles = registry.len(),
            animations = animations.len(),
            "farm_tiles_loaded"
        );
        Ok(Self {
            registry,
            animations,
            cell_size,
        })
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &TileRegistry {
        &self.registry
    }

    pub(crate) fn cell_size(&self) -> Size {
        self.cell_size
    }

    /// Animation name or plain tile key.
    pub(crate) fn drawable(&self, key: &str) -> Option<Drawable> {
        if let Some(frames) = self.animations.get(key) {
            return Drawable::animated(Rc::clone(frames));
        }
        self.registry.tile_by_key(key).cloned().map(Drawable::from)
    }

    pub(crate) fn has_tag(&self, drawable: &Drawable, tag: Tag) -> bool {
        self.registry.has_tag(drawable.tile_id(), tag)
    }
}

impl TagLookup for FarmTiles {
    fn has_tag(&self, tile: TileId, tag: Tag) -> bool {
        self.registry.has_tag(tile, tag)
    }
}

fn bind(registry: &mut TileRegistry, tile: &Tile, tags: &[Tag]) -> Result<(), FarmError> {
    for &tag in tags {
        registry.bind_tag(tile.id(), tag)?;
    }
    Ok(())
}

fn tile_image(
    loader: &ImageLoader,
    key: &str,
    cell_size: Size,
    generate: impl FnOnce() -> Image,
) -> Image {
    match loader.load(key) {
        Ok(image) if image.size() == cell_size => image,
        Ok(image) => {
            warn!(
                tile = key,
                width = image.width(),
                height = image.height(),
                cell_width = cell_size.width,
                cell_height = cell_size.height,
                "tile_image_wrong_size_using_generated"
            );
            generate()
        }
        Err(ImageLoadError::Open { .. }) => {
            debug!(tile = key, "tile_image_missing_using_generated");
            generate()
        }
        Err(error) => {
            warn!(tile = key, error = %error, "tile_image_load_failed_using_generated");
            generate()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiles() -> FarmTiles {
        let loader = ImageLoader::new("definitely/not/an/asset/dir");
        FarmTiles::load(&loader, Size::new(8, 8)).expect("tiles")
    }

    #[test]
    fn missing_assets_fall_back_to_generated_art() {
        let tiles = tiles();
        let grass = tiles.drawable("grass").expect("grass");
        assert_eq!(grass.current_frame().image().size(), Size::new(8, 8));
        assert_eq!(tiles.registry().len(), TILES.len() + 3 + 4);
    }

    #[test]
    fn animations_resolve_to_animated_drawables() {
        let tiles = tiles();
        let water = tiles.drawable("water").expect("water");
        assert_eq!(water.frame_count(), 3);
        assert!(tiles.has_tag(&water.with_frame(2), COLLISION_OBJECT));
        assert!(tiles.has_tag(&water, LOOPING));
        let door = tiles.drawable("door").expect("door");
        assert!(!tiles.has_tag(&door, LOOPING));
    }

    #[test]
    fn tags_follow_the_tile_table() {
        let tiles = tiles();
        let dirt = tiles.drawable("dirt").expect("dirt");
        assert!(tiles.has_tag(&dirt, ARABLE));
        assert!(!tiles.has_tag(&dirt, COLLISION_OBJECT));
        assert!(tiles.has_tag(&tiles.drawable("bed").expect("bed"), BED));
        assert!(tiles.drawable("lava").is_none());
    }
}
