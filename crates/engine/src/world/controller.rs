use std::rc::Rc;

use tracing::{debug, warn};

use crate::compositor::{Composite, Display};
use crate::content::{Tag, TagLookup};
use crate::geometry::{Point, Rect};

use super::{BlockGrid, Map};

/// Tag that makes a tile impassable.
pub const COLLISION_OBJECT: Tag = Tag("COLLISION_OBJECT");

/// How [`MapController::refresh_block_grid`] treats cells blocked by an
/// earlier refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Only ever adds blocks; a cell stays blocked until the map is reloaded.
    #[default]
    Accumulate,
    /// Recomputes from scratch, so a replaced tile can become walkable.
    Rebuild,
}

/// Binds a loaded [`Map`] to the display and owns its collision grid.
#[derive(Debug)]
pub struct MapController {
    map: Map,
    block_grid: BlockGrid,
    policy: CollisionPolicy,
}

impl MapController {
    pub fn new(map: Map) -> Self {
        Self::with_policy(map, CollisionPolicy::default())
    }

    pub fn with_policy(map: Map, policy: CollisionPolicy) -> Self {
        let block_grid = BlockGrid::new(map.grid_size());
        Self {
            map,
            block_grid,
            policy,
        }
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut Map {
        &mut self.map
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    pub fn block_grid(&self) -> &BlockGrid {
        &self.block_grid
    }

    /// Unions the map's invisible blocks and every cell whose content is
    /// tagged [`COLLISION_OBJECT`] into the block grid.
    pub fn refresh_block_grid(&mut self, tags: &dyn TagLookup) {
        if self.policy == CollisionPolicy::Rebuild {
            self.block_grid.clear();
        }
        if let Some(invisible) = self.map.invisible_blocks() {
            self.block_grid.union_with(invisible);
        }

        for (name, layer) in self.map.layers() {
            let Ok(layer) = layer.try_borrow() else {
                warn!(layer = name, "collision_refresh_layer_busy_skipped");
                continue;
            };
            for cell in layer.cells() {
                let Some(content) = cell.content() else {
                    continue;
                };
                if tags.has_tag(content.tile_id(), COLLISION_OBJECT) {
                    self.block_grid.block(cell.coordinate());
                }
            }
        }

        debug!(
            map = self.map.key(),
            blocked = self.block_grid.blocked_count(),
            policy = ?self.policy,
            "block_grid_refreshed"
        );
    }

    pub fn is_block(&self, coordinate: Point) -> bool {
        self.block_grid.is_blocked(coordinate)
    }

    /// Unshifts the map's layers so they sit below anything already on the
    /// display (UI layers), keeping the map's own order.
    pub fn attach_to_display(&self, display: &mut Display) {
        let layers: Vec<_> = self.map.layers().collect();
        for (name, layer) in layers.into_iter().rev() {
            let shared = Rc::clone(layer);
            display.unshift_layer(name, shared);
        }
    }

    pub fn detach_from_display(&self, display: &mut Display) {
        for name in self.map.layer_names() {
            display.remove_layer(name);
        }
    }

    /// Moves every map layer on screen, e.g. to letterbox a small map.
    pub fn set_offset(&self, offset: Point) {
        for (_, layer) in self.map.layers() {
            layer.borrow_mut().layer_mut().set_offset(offset);
        }
    }

    /// Restricts every map layer to the camera's view.
    pub fn set_crop(&self, crop: Option<Rect>) {
        for (_, layer) in self.map.layers() {
            layer.borrow_mut().layer_mut().set_crop(crop);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::compositor::{Drawable, Image, Layer, Tile};
    use crate::content::TileRegistry;
    use crate::geometry::Size;

    struct Fixture {
        registry: TileRegistry,
        fence: Tile,
        grass: Tile,
    }

    fn fixture() -> Fixture {
        let mut registry = TileRegistry::new();
        let fence = registry
            .register("fence", Image::new(Size::new(1, 1)))
            .expect("fence");
        let grass = registry
            .register("grass", Image::new(Size::new(1, 1)))
            .expect("grass");
        registry
            .bind_tag(fence.id(), COLLISION_OBJECT)
            .expect("tag");
        Fixture {
            registry,
            fence,
            grass,
        }
    }

    fn map() -> Map {
        let layers = ["ground", "fences"];
        Map::new("farm", Size::new(3, 3), Size::new(1, 1), &layers).expect("map")
    }

    fn place(map: &Map, layer: &str, at: Point, tile: &Tile) {
        map.layer(layer)
            .expect("layer")
            .borrow_mut()
            .update_cell(at, Drawable::from(tile.clone()));
    }

    #[test]
    fn collision_is_union_of_invisible_blocks_and_tagged_tiles() {
        let fx = fixture();
        let mut map = map();
        map.add_invisible_block(Point::new(0, 0));
        place(&map, "ground", Point::new(2, 0), &fx.grass);
        place(&map, "fences", Point::new(1, 1), &fx.fence);
        let mut controller = MapController::new(map);

        controller.refresh_block_grid(&fx.registry);

        assert!(controller.is_block(Point::new(0, 0)));
        assert!(controller.is_block(Point::new(1, 1)));
        assert!(!controller.is_block(Point::new(2, 2)));
        assert!(!controller.is_block(Point::new(2, 0)));
        assert!(!controller.is_block(Point::new(3, 0)));
        assert!(!controller.is_block(Point::new(-1, 1)));
    }

    #[test]
    fn accumulate_keeps_cells_blocked_after_tile_changes() {
        let fx = fixture();
        let map = map();
        place(&map, "fences", Point::new(1, 1), &fx.fence);
        let mut controller = MapController::new(map);
        controller.refresh_block_grid(&fx.registry);

        place(controller.map(), "fences", Point::new(1, 1), &fx.grass);
        controller.refresh_block_grid(&fx.registry);

        assert!(controller.is_block(Point::new(1, 1)));
    }

    #[test]
    fn rebuild_lets_replaced_tiles_become_walkable() {
        let fx = fixture();
        let map = map();
        place(&map, "fences", Point::new(1, 1), &fx.fence);
        let mut controller = MapController::with_policy(map, CollisionPolicy::Rebuild);
        controller.refresh_block_grid(&fx.registry);
        assert!(controller.is_block(Point::new(1, 1)));

        controller
            .map()
            .layer("fences")
            .expect("layer")
            .borrow_mut()
            .clear_cell(Point::new(1, 1));
        controller.refresh_block_grid(&fx.registry);

        assert!(!controller.is_block(Point::new(1, 1)));
    }

    #[test]
    fn attach_puts_map_below_existing_layers_in_order() {
        let controller = MapController::new(map());
        let mut display = Display::new(Size::new(3, 3), [0, 0, 0, 255]);
        let message_box = Rc::new(RefCell::new(Layer::new(Size::new(1, 1))));
        display.append_layer("message_box", message_box);

        controller.attach_to_display(&mut display);

        assert_eq!(
            display.layer_names().collect::<Vec<_>>(),
            vec!["ground", "fences", "message_box"]
        );

        controller.detach_from_display(&mut display);
        let names: Vec<_> = display.layer_names().collect();
        assert_eq!(names, ["message_box"]);
    }

    #[test]
    fn offset_and_crop_reach_every_layer() {
        let controller = MapController::new(map());
        controller.set_offset(Point::new(4, 2));
        controller.set_crop(Some(Rect::new(1, 1, 2, 2)));

        for (_, layer) in controller.map().layers() {
            let layer = layer.borrow();
            assert_eq!(layer.layer().offset(), Point::new(4, 2));
            assert_eq!(layer.layer().crop(), Some(Rect::new(1, 1, 2, 2)));
        }
    }
}
