//! The farm demo: a house and a field, doors between them, soil to till,
//! seeds to grow and a bed that ends the day.

mod art;
mod character;
mod curtain;
mod data;
mod error;
mod font;
mod maps;
mod message_box;
mod script;
mod tiles;


use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use farmstead_engine::{
    Display, EngineContext, Game, GameError, GridLayerRef, ImageLoader, Key, Map, Point,
    SceneError, SceneManager, Tag, TimerHandle,
};
use tracing::{info, warn};

use self::character::{Character, Direction};
use self::curtain::Curtain;
use self::data::FarmData;
use self::error::FarmError;
use self::message_box::MessageBox;
use self::script::{FarmCommand, ScriptContext};
use self::tiles::{FarmTiles, ARABLE, BED, HARVESTABLE, SOWABLE};

/// Subdirectory of the asset root holding tile PNGs.
const TILE_DIR: &str = "tiles";
const CROPS_LAYER: &str = "crops";
const GROWTH_TIME: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
pub(crate) struct FarmGame {
    world: Option<FarmWorld>,
}

impl FarmGame {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
struct FarmWorld {
    data: FarmData,
    tiles: FarmTiles,
    scenes: SceneManager,
    script: ScriptContext,
    animations: Vec<TimerHandle>,
    harvested: u32,
}

impl FarmWorld {
    fn load(data: FarmData, ctx: &mut EngineContext) -> Result<Self, FarmError> {
        let cell_size = ctx.settings().cell_size;
        let loader = ImageLoader::new(ctx.asset_root().join(TILE_DIR));
        let tiles = FarmTiles::load(&loader, cell_size)?;
        let scheduler = ctx.scheduler().clone();

        let mut scenes = SceneManager::new(ctx.display().size());
        let mut animations = Vec::new();
        for layout in &data.maps {
            let map = maps::build_map(layout, &tiles)?;
            animations.extend(maps::animate_looping(&map, &tiles, &scheduler)?);
            scenes.load_map(map, &tiles);
        }

        let display = ctx.display_mut();
        let character = Character::new(cell_size, &scheduler)?;
        character.attach(display);
        let message_box = MessageBox::attach(display, &scheduler);
        let curtain = Curtain::attach(display, &scheduler);

        let script = ScriptContext {
            scheduler,
            curtain,
            message_box,
            character: Rc::new(RefCell::new(character)),
            commands: Rc::new(RefCell::new(VecDeque::new())),
            messages: Rc::new(data.messages.clone()),
            day: Rc::new(Cell::new(1)),
        };
        let spawn = data.spawn.clone();
        let mut world = Self {
            data,
            tiles,
            scenes,
            script,
            animations,
            harvested: 0,
        };
        world.enter_map(&spawn.map, spawn.at, spawn.facing, display)?;
        info!(
            maps = world.data.maps.len(),
            animations = world.animations.len(),
            "farm_loaded"
        );
        Ok(world)
    }

    fn enter_map(
        &mut self,
        key: &str,
        at: Point,
        facing: Direction,
        display: &mut Display,
    ) -> Result<(), SceneError> {
        self.scenes.change_map(key, display)?;
        let mut character = self.script.character.borrow_mut();
        character.teleport(at);
        character.face(facing);
        character.sync_view(&mut self.scenes);
        info!(map = key, x = at.x, y = at.y, "farm_map_entered");
        Ok(())
    }

    fn run_commands(&mut self, display: &mut Display) {
        loop {
            let next = self.script.commands.borrow_mut().pop_front();
            let Some(command) = next else {
                return;
            };
            match command {
                FarmCommand::ChangeMap {
                    map,
                    arrive_at,
                    facing,
                    done,
                } => {
                    if let Err(error) = self.enter_map(&map, arrive_at, facing, display) {
                        warn!(map = %map, error = %error, "farm_map_change_failed");
                    }
                    done.invoke();
                }
            }
        }
    }

    /// Acts on the cell the character faces: doors first, then the bed,
    /// then crops and soil.
    fn interact(&mut self) {
        let (cell, facing) = {
            let character = self.script.character.borrow();
            (character.facing_coordinate(), character.facing())
        };
        let Some(controller) = self.scenes.controller() else {
            return;
        };
        let map = controller.map();

        let door = self
            .data
            .layout(map.key())
            .ok()
            .and_then(|layout| layout.door_at(cell, facing))
            .cloned();
        if let Some(door) = door {
            match map.layer(&door.layer) {
                Some(layer) => script::door_transition(&self.script, layer, door).start(),
                None => warn!(layer = %door.layer, "farm_door_layer_missing"),
            }
            return;
        }

        if tagged_layer(map, &self.tiles, cell, BED).is_some() {
            script::sleep(&self.script).start();
            return;
        }

        if let Some(layer) = tagged_layer(map, &self.tiles, cell, HARVESTABLE) {
            layer.borrow_mut().clear_cell(cell);
            self.harvested += 1;
            info!(
                x = cell.x,
                y = cell.y,
                harvested = self.harvested,
                "crop_harvested"
            );
            return;
        }

        if tagged_layer(map, &self.tiles, cell, SOWABLE).is_some() {
            if let Some(crops) = map.layer(CROPS_LAYER) {
                self.plant(crops, cell);
            }
            return;
        }

        if let Some(layer) = tagged_layer(map, &self.tiles, cell, ARABLE) {
            if let Some(tilled) = self.tiles.drawable("tilled") {
                layer.borrow_mut().update_cell(cell, tilled);
                info!(x = cell.x, y = cell.y, "soil_tilled");
            }
        }
    }

    /// Sows a sprout that grows into a crop after [`GROWTH_TIME`].
    fn plant(&self, crops: GridLayerRef, cell: Point) {
        let occupied = crops
            .borrow()
            .get_cell(cell)
            .is_some_and(|cell| !cell.is_empty());
        if occupied {
            return;
        }
        let sprout = self.tiles.drawable("sprout");
        let crop = self.tiles.drawable("crop");
        let (Some(sprout), Some(crop)) = (sprout, crop) else {
            warn!("farm_crop_tiles_missing");
            return;
        };

        let sprout_id = sprout.tile_id();
        crops.borrow_mut().update_cell(cell, sprout);
        let grown = self.script.scheduler.delay(GROWTH_TIME, move || {
            let Ok(mut grid) = crops.try_borrow_mut() else {
                return;
            };
            let still_sprouting = grid
                .get_cell(cell)
                .and_then(|cell| cell.content())
                .is_some_and(|content| content.tile_id() == sprout_id);
            if still_sprouting {
                grid.update_cell(cell, crop);
            }
        });
        match grown {
            Ok(_) => info!(x = cell.x, y = cell.y, "seed_planted"),
            Err(error) => warn!(error = %error, "crop_growth_schedule_failed"),
        }
    }
}

/// Topmost layer whose content at `cell` carries `tag`.
fn tagged_layer(map: &Map, tiles: &FarmTiles, cell: Point, tag: Tag) -> Option<GridLayerRef> {
    let layers: Vec<_> = map.layers().collect();
    layers.into_iter().rev().find_map(|(_, layer)| {
        let tagged = layer
            .borrow()
            .get_cell(cell)
            .and_then(|cell| cell.content())
            .is_some_and(|content| tiles.has_tag(content, tag));
        tagged.then(|| Rc::clone(layer))
    })
}

impl Game for FarmGame {
    fn load(&mut self, ctx: &mut EngineContext) -> Result<(), GameError> {
        let data = FarmData::builtin()?;
        let world = FarmWorld::load(data, ctx)?;
        script::welcome(&world.script).start();
        self.world = Some(world);
        Ok(())
    }

    fn update(&mut self, dt: Duration, ctx: &mut EngineContext) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        world.run_commands(ctx.display_mut());
        if let Some(controller) = world.scenes.controller() {
            world.script.character.borrow_mut().update(dt, controller);
        }
    }

    fn key_down(&mut self, key: Key, _ctx: &mut EngineContext) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        if world.script.message_box.is_displayed() {
            if matches!(key, Key::Confirm | Key::Interact | Key::Cancel) {
                world.script.message_box.confirm();
            }
            return;
        }
        if world.script.character.borrow().is_frozen() {
            return;
        }
        if let Some(direction) = Direction::from_key(key) {
            world.script.character.borrow_mut().key_down(direction);
        } else if key == Key::Interact {
            world.interact();
        }
    }

    fn key_up(&mut self, key: Key, _ctx: &mut EngineContext) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        if let Some(direction) = Direction::from_key(key) {
            world.script.character.borrow_mut().key_up(direction);
        }
    }

    fn before_render(&mut self, _ctx: &mut EngineContext) {
        if let Some(world) = self.world.as_mut() {
            world
                .script
                .character
                .borrow_mut()
                .sync_view(&mut world.scenes);
        }
    }

    fn shutdown(&mut self, ctx: &mut EngineContext) {
        let Some(world) = self.world.take() else {
            return;
        };
        for timer in &world.animations {
            ctx.scheduler().remove(timer);
        }
        let character = world.script.character.borrow();
        ctx.scheduler().remove(character.animation());
        info!(
            day = world.script.day.get(),
            harvested = world.harvested,
            "farm_shutdown"
        );
    }
}
