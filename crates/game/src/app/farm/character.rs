use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use farmstead_engine::{
    Display, Image, Key, Layer, LayerRef, MapController, Point, SceneManager, ScheduleError,
    Scheduler, Size, TimerHandle, Vec2,
};
use serde::Deserialize;

use super::art;

pub(crate) const LAYER: &str = "character";

/// Pixels per second.
const WALK_SPEED: f32 = 64.0;
const STEP_RATE: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub(crate) fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub(crate) fn from_key(key: Key) -> Option<Direction> {
        match key {
            Key::Up => Some(Direction::Up),
            Key::Right => Some(Direction::Right),
            Key::Down => Some(Direction::Down),
            Key::Left => Some(Direction::Left),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The player: a sprite layer that walks over the current map, stopping at
/// blocked cells and the map edge.
///
/// Positions are world pixels of the sprite's top-left corner. The most
/// recently pressed direction key wins while several are held.
#[derive(Debug)]
pub(crate) struct Character {
    position: Vec2,
    size: Size,
    facing: Direction,
    held: Vec<Direction>,
    moving: bool,
    frozen: bool,
    step: Rc<Cell<u32>>,
    animation: TimerHandle,
    layer: Rc<RefCell<Layer>>,
    /// Two walking frames per direction.
    sprites: Vec<Image>,
    painted: Option<(Direction, u32)>,
}

impl Character {
    pub(crate) fn new(cell_size: Size, scheduler: &Scheduler) -> Result<Self, ScheduleError> {
        let step = Rc::new(Cell::new(0));
        let animation = {
            let step = Rc::clone(&step);
            scheduler.register(STEP_RATE, 2, move |count| step.set(count))?
        };
        let sprites = Direction::ALL
            .iter()
            .flat_map(|&facing| (0..2).map(move |step| art::character(cell_size, facing, step)))
            .collect();

        Ok(Self {
            position: Vec2::ZERO,
            size: cell_size,
            facing: Direction::Down,
            held: Vec::new(),
            moving: false,
            frozen: false,
            step,
            animation,
            layer: Rc::new(RefCell::new(Layer::new(cell_size))),
            sprites,
            painted: None,
        })
    }

    pub(crate) fn attach(&self, display: &mut Display) {
        let layer: LayerRef = self.layer.clone();
        display.append_layer(LAYER, layer);
    }

    pub(crate) fn facing(&self) -> Direction {
        self.facing
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> Vec2 {
        self.position
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// A frozen character ignores direction keys and stands still.
    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        if frozen {
            self.held.clear();
            self.moving = false;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_moving(&self) -> bool {
        self.moving
    }

    pub(crate) fn animation(&self) -> &TimerHandle {
        &self.animation
    }

    pub(crate) fn key_down(&mut self, direction: Direction) {
        if self.frozen {
            return;
        }
        self.held.retain(|held| *held != direction);
        self.held.push(direction);
        self.facing = direction;
    }

    pub(crate) fn key_up(&mut self, direction: Direction) {
        self.held.retain(|held| *held != direction);
        if let Some(&latest) = self.held.last() {
            self.facing = latest;
        }
    }

    pub(crate) fn face(&mut self, direction: Direction) {
        self.facing = direction;
    }

    /// Cell under the sprite's centre.
    pub(crate) fn coordinate(&self) -> Point {
        let center = self.center();
        Point::new(
            (center.x / self.size.width as f32).floor() as i32,
            (center.y / self.size.height as f32).floor() as i32,
        )
    }

    /// Cell in front of the character.
    pub(crate) fn facing_coordinate(&self) -> Point {
        let (dx, dy) = self.facing.delta();
        self.coordinate().offset(dx, dy)
    }

    pub(crate) fn teleport(&mut self, cell: Point) {
        self.position = Vec2::new(
            (cell.x * self.size.width as i32) as f32,
            (cell.y * self.size.height as i32) as f32,
        );
        self.held.clear();
        self.moving = false;
    }

    pub(crate) fn update(&mut self, dt: Duration, controller: &MapController) {
        let direction = match self.held.last() {
            Some(&direction) if !self.frozen => direction,
            _ => {
                self.moving = false;
                return;
            }
        };

        let (dx, dy) = direction.delta();
        let distance = WALK_SPEED * dt.as_secs_f32();
        let before = self.position;
        let world = controller.map().pixel_size();
        self.try_move(Vec2::new(dx as f32 * distance, 0.0), world, controller);
        self.try_move(Vec2::new(0.0, dy as f32 * distance), world, controller);
        self.moving = self.position != before;
    }

    /// Moves in pieces shorter than a cell so a fast frame cannot carry the
    /// centre across a blocked cell. Stops at the first blocked piece.
    fn try_move(&mut self, displacement: Vec2, world: Size, controller: &MapController) {
        let length = displacement.x.abs().max(displacement.y.abs());
        if length == 0.0 {
            return;
        }
        let cell = self.size.width.min(self.size.height);
        let max_piece = cell.saturating_sub(1).max(1);
        let pieces = (length / max_piece as f32).ceil().max(1.0) as u32;
        let max_x = world.width.saturating_sub(self.size.width) as f32;
        let max_y = world.height.saturating_sub(self.size.height) as f32;

        let start = self.position;
        for piece in 1..=pieces {
            let target = start + displacement * (piece as f32 / pieces as f32);
            let previous = self.position;
            self.position = Vec2::new(target.x.clamp(0.0, max_x), target.y.clamp(0.0, max_y));
            if controller.is_block(self.coordinate()) {
                self.position = previous;
                return;
            }
        }
    }

    fn center(&self) -> Vec2 {
        self.position + Vec2::new(self.size.width as f32 / 2.0, self.size.height as f32 / 2.0)
    }

    /// Centres the camera on the character, pushes the view into the map
    /// layers and moves the sprite to its screen position.
    pub(crate) fn sync_view(&mut self, scenes: &mut SceneManager) {
        let center = self.center();
        let Some(camera) = scenes.camera_mut() else {
            return;
        };
        let viewport = camera.viewport_size();
        camera.set_offset(Vec2::new(
            center.x - viewport.width as f32 / 2.0,
            center.y - viewport.height as f32 / 2.0,
        ));
        let view = camera.viewport_rect();
        let letterbox = camera.letterbox_offset();
        scenes.update_scene();

        let screen = Point::new(
            letterbox.x + self.position.x.round() as i32 - view.x,
            letterbox.y + self.position.y.round() as i32 - view.y,
        );
        let step = if self.moving { self.step.get() } else { 0 };
        let mut layer = self.layer.borrow_mut();
        layer.set_offset(screen);
        if self.painted != Some((self.facing, step)) {
            layer.clear();
            if let Some(sprite) = self.sprites.get(self.facing.index() * 2 + step as usize) {
                layer.blit(sprite, Point::ORIGIN);
            }
            self.painted = Some((self.facing, step));
        }
    }

    #[cfg(test)]
    pub(crate) fn screen_offset(&self) -> Point {
        self.layer.borrow().offset()
    }
}

#[cfg(test)]
mod tests {
    use farmstead_engine::{Map, Tag, TagLookup, TileId};

    use super::*;

    const CELL: Size = Size::new(8, 8);

    struct NoTags;

    impl TagLookup for NoTags {
        fn has_tag(&self, _tile: TileId, _tag: Tag) -> bool {
            false
        }
    }

    fn controller(blocked: &[Point]) -> MapController {
        let mut map = Map::new("field", Size::new(6, 4), CELL, &["ground"]).expect("map");
        for &cell in blocked {
            map.add_invisible_block(cell);
        }
        let mut controller = MapController::new(map);
        controller.refresh_block_grid(&NoTags);
        controller
    }

    fn character() -> Character {
        Character::new(CELL, &Scheduler::new()).expect("character")
    }

    #[test]
    fn walks_in_the_latest_held_direction() {
        let controller = controller(&[]);
        let mut character = character();
        character.teleport(Point::new(1, 1));
        character.key_down(Direction::Down);
        character.key_down(Direction::Right);
        character.update(Duration::from_millis(125), &controller);
        assert_eq!(character.position(), Vec2::new(16.0, 8.0));
        assert_eq!(character.facing(), Direction::Right);
        assert!(character.is_moving());

        character.key_up(Direction::Right);
        assert_eq!(character.facing(), Direction::Down);
    }

    #[test]
    fn blocked_cells_stop_movement() {
        let controller = controller(&[Point::new(2, 1)]);
        assert!(controller.is_block(Point::new(2, 1)));
        let mut character = character();
        character.teleport(Point::new(1, 1));
        character.key_down(Direction::Right);
        for _ in 0..10 {
            character.update(Duration::from_millis(50), &controller);
        }
        assert_eq!(character.coordinate(), Point::new(1, 1));
        assert!(!character.is_moving());
    }

    #[test]
    fn long_frame_does_not_step_over_a_wall() {
        let controller = controller(&[Point::new(2, 1)]);
        let mut character = character();
        character.teleport(Point::new(1, 1));
        character.key_down(Direction::Right);

        character.update(Duration::from_millis(250), &controller);

        assert_eq!(character.coordinate(), Point::new(1, 1));
        assert!(character.position().x < 12.0);
    }

    #[test]
    fn long_frame_without_walls_covers_the_full_distance() {
        let controller = controller(&[]);
        let mut character = character();
        character.teleport(Point::new(0, 1));
        character.key_down(Direction::Right);

        character.update(Duration::from_millis(250), &controller);

        assert_eq!(character.position(), Vec2::new(16.0, 8.0));
        assert_eq!(character.coordinate(), Point::new(2, 1));
    }

    #[test]
    fn map_edges_clamp_position() {
        let controller = controller(&[]);
        let mut character = character();
        character.key_down(Direction::Left);
        character.update(Duration::from_secs(1), &controller);
        assert_eq!(character.position(), Vec2::ZERO);
        character.key_up(Direction::Left);
        character.key_down(Direction::Down);
        character.update(Duration::from_secs(5), &controller);
        assert_eq!(character.position(), Vec2::new(0.0, 24.0));
    }

    #[test]
    fn frozen_character_ignores_keys() {
        let controller = controller(&[]);
        let mut character = character();
        character.set_frozen(true);
        character.key_down(Direction::Right);
        character.update(Duration::from_secs(1), &controller);
        assert_eq!(character.position(), Vec2::ZERO);
        assert_eq!(character.facing(), Direction::Down);
    }

    #[test]
    fn facing_coordinate_is_the_next_cell() {
        let mut character = character();
        character.teleport(Point::new(3, 2));
        character.face(Direction::Up);
        assert_eq!(character.facing_coordinate(), Point::new(3, 1));
        character.face(Direction::Left);
        assert_eq!(character.facing_coordinate(), Point::new(2, 2));
    }

    #[test]
    fn sync_view_places_sprite_relative_to_the_camera() {
        let map = Map::new("wide", Size::new(10, 2), CELL, &["ground"]).expect("map");
        let mut scenes = SceneManager::new(Size::new(32, 32));
        scenes.load_map(map, &NoTags);
        let mut display = Display::new(Size::new(32, 32), [0, 0, 0, 255]);
        scenes.change_map("wide", &mut display).expect("change");

        let mut character = character();
        character.attach(&mut display);
        character.teleport(Point::new(6, 0));
        character.sync_view(&mut scenes);

        let view = scenes.camera().expect("camera").viewport_rect();
        assert_eq!(view.x, 36);
        // 32px tall view over a 16px world: letterboxed by 8 vertically.
        assert_eq!(character.screen_offset(), Point::new(48 - 36, 8));
        assert_eq!(display.layer_names().last(), Some(LAYER));
    }

    #[test]
    fn step_animation_runs_on_a_timer() {
        let scheduler = Scheduler::new();
        let character = Character::new(CELL, &scheduler).expect("character");
        assert!(character.animation().is_active());
        scheduler.advance(Duration::from_millis(170));
        assert_eq!(character.step.get(), 1);
        scheduler.advance(Duration::from_millis(170));
        assert_eq!(character.step.get(), 0);
    }
}
