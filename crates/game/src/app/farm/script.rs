//! Multi-step cutscenes built on [`Sequencer`]: walking through doors,
//! sleeping, the welcome message.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use farmstead_engine::{
    ContinuationHandle, Drawable, GridLayerRef, Point, ScheduleError, Scheduler, Sequencer,
    StepResult,
};
use tracing::{info, warn};

use super::character::{Character, Direction};
use super::curtain::Curtain;
use super::data::{Door, Messages};
use super::message_box::MessageBox;

/// Alpha change per curtain step.
const FADE_SPEED: u8 = 51;
/// Door frames per second.
const DOOR_RATE: f64 = 10.0;
const SLEEP_DELAY: Duration = Duration::from_millis(1500);

/// Work that needs the display or the scene manager, which timer callbacks
/// cannot reach. Drained by the game on its next update.
#[derive(Debug)]
pub(crate) enum FarmCommand {
    ChangeMap {
        map: String,
        arrive_at: Point,
        facing: Direction,
        done: ContinuationHandle,
    },
}

pub(crate) type CommandQueue = Rc<RefCell<VecDeque<FarmCommand>>>;

/// Everything a script step may touch. Cheap to clone.
#[derive(Debug, Clone)]
pub(crate) struct ScriptContext {
    pub(crate) scheduler: Scheduler,
    pub(crate) curtain: Curtain,
    pub(crate) message_box: MessageBox,
    pub(crate) character: Rc<RefCell<Character>>,
    pub(crate) commands: CommandQueue,
    pub(crate) messages: Rc<Messages>,
    pub(crate) day: Rc<Cell<u32>>,
}

impl ScriptContext {
    fn freeze(&self, frozen: bool) -> StepResult {
        self.character.borrow_mut().set_frozen(frozen);
        StepResult::Done
    }

    fn say(&self, text: &str) -> StepResult {
        pending("message", self.message_box.play(text))
    }
}

/// A step that could not start is skipped so the script never stalls.
fn pending(step: &'static str, started: Result<ContinuationHandle, ScheduleError>) -> StepResult {
    match started {
        Ok(handle) => StepResult::Pending(handle),
        Err(error) => {
            warn!(step, error = %error, "script_step_failed");
            StepResult::Done
        }
    }
}

/// Plays the door's frames from shut to open; the handle fires on the last
/// frame.
pub(crate) fn open_door(
    scheduler: &Scheduler,
    layer: &GridLayerRef,
    cell: Point,
) -> Result<ContinuationHandle, ScheduleError> {
    let door: Option<Drawable> = layer
        .borrow()
        .get_cell(cell)
        .and_then(|cell| cell.content())
        .cloned();
    let frames = door.as_ref().map_or(1, Drawable::frame_count).max(1);
    let done = ContinuationHandle::new();
    let opened = done.clone();
    let layer = Rc::clone(layer);
    scheduler.register_once(DOOR_RATE, frames as u32, move |count| {
        if let Some(door) = &door {
            let frame = door.with_frame(count as usize);
            if let Ok(mut grid) = layer.try_borrow_mut() {
                grid.update_cell(cell, frame);
            }
        }
        if count as usize + 1 >= frames {
            opened.invoke();
        }
    })?;
    Ok(done)
}

/// Freeze, open the door, fade out, swap maps, shut the door behind, fade
/// back in, unfreeze.
pub(crate) fn door_transition(ctx: &ScriptContext, layer: GridLayerRef, door: Door) -> Sequencer {
    info!(to = %door.leads_to, "door_transition_started");
    let shut = layer
        .borrow()
        .get_cell(door.cell)
        .and_then(|cell| cell.content())
        .map(|content| content.with_frame(0));

    let sequence = Sequencer::default();
    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(true));

    let step_ctx = ctx.clone();
    let door_layer = Rc::clone(&layer);
    let cell = door.cell;
    sequence.push_fn(move || {
        let opening = open_door(&step_ctx.scheduler, &door_layer, cell);
        pending("open_door", opening)
    });

    let step_ctx = ctx.clone();
    sequence.push_fn(move || pending("fade_out", step_ctx.curtain.fade_out(FADE_SPEED)));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || {
        let done = ContinuationHandle::new();
        step_ctx
            .commands
            .borrow_mut()
            .push_back(FarmCommand::ChangeMap {
                map: door.leads_to,
                arrive_at: door.arrive_at,
                facing: door.arrive_facing,
                done: done.clone(),
            });
        StepResult::Pending(done)
    });

    sequence.push_fn(move || {
        if let Some(shut) = shut {
            layer.borrow_mut().update_cell(cell, shut);
        }
        StepResult::Done
    });

    let step_ctx = ctx.clone();
    sequence.push_fn(move || pending("fade_in", step_ctx.curtain.fade_in(FADE_SPEED)));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(false));
    sequence
}

/// Good night, fade to black, wait, next day, fade in, good morning.
pub(crate) fn sleep(ctx: &ScriptContext) -> Sequencer {
    info!(day = ctx.day.get(), "sleep_started");
    let sequence = Sequencer::default();

    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(true));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.say(&step_ctx.messages.good_night));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || pending("fade_out", step_ctx.curtain.fade_out(FADE_SPEED)));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || {
        let done = ContinuationHandle::new();
        let woke = done.clone();
        let started = step_ctx
            .scheduler
            .delay(SLEEP_DELAY, move || woke.invoke())
            .map(|_| done);
        pending("sleep_delay", started)
    });

    let step_ctx = ctx.clone();
    sequence.push_fn(move || {
        let day = step_ctx.day.get().saturating_add(1);
        step_ctx.day.set(day);
        info!(day, "day_started");
        StepResult::Done
    });

    let step_ctx = ctx.clone();
    sequence.push_fn(move || pending("fade_in", step_ctx.curtain.fade_in(FADE_SPEED)));

    let step_ctx = ctx.clone();
    sequence.push_fn(move || {
        let text = step_ctx.messages.good_morning_for(step_ctx.day.get());
        step_ctx.say(&text)
    });

    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(false));
    sequence
}

pub(crate) fn welcome(ctx: &ScriptContext) -> Sequencer {
    let sequence = Sequencer::default();
    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(true));
    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.say(&step_ctx.messages.welcome));
    let step_ctx = ctx.clone();
    sequence.push_fn(move || step_ctx.freeze(false));
    sequence
}

#[cfg(test)]
mod tests {
    use farmstead_engine::{Display, ImageLoader, Map, Size};

    use super::*;
    use crate::app::farm::tiles::FarmTiles;

    const CELL: Size = Size::new(4, 4);
    const TICK: Duration = Duration::from_millis(100);

    fn context() -> (Display, ScriptContext) {
        let mut display = Display::new(Size::new(200, 100), [0, 0, 0, 255]);
        let scheduler = Scheduler::new();
        let character = Character::new(CELL, &scheduler).expect("character");
        let ctx = ScriptContext {
            curtain: Curtain::attach(&mut display, &scheduler),
            message_box: MessageBox::attach(&mut display, &scheduler),
            scheduler,
            character: Rc::new(RefCell::new(character)),
            commands: Rc::new(RefCell::new(VecDeque::new())),
            messages: Rc::new(Messages {
                welcome: "hi".to_string(),
                good_night: "night".to_string(),
                good_morning: "day {day}".to_string(),
            }),
            day: Rc::new(Cell::new(1)),
        };
        (display, ctx)
    }

    fn run(ctx: &ScriptContext, ticks: usize) {
        for _ in 0..ticks {
            ctx.scheduler.advance(TICK);
        }
    }

    #[test]
    fn sleep_waits_for_each_message_and_advances_the_day() {
        let (_display, ctx) = context();
        sleep(&ctx).start();
        assert!(ctx.character.borrow().is_frozen());
        run(&ctx, 10);
        assert_eq!(ctx.message_box.shown_text(), "night");
        assert_eq!(ctx.curtain.alpha(), 0);

        ctx.message_box.confirm();
        run(&ctx, 5);
        assert_eq!(ctx.curtain.alpha(), 255);
        run(&ctx, 10);
        assert_eq!(ctx.day.get(), 1);
        run(&ctx, 7);
        assert_eq!(ctx.day.get(), 2);
        run(&ctx, 6);
        assert_eq!(ctx.curtain.alpha(), 0);
        run(&ctx, 10);
        assert_eq!(ctx.message_box.shown_text(), "day 2");
        assert!(ctx.character.borrow().is_frozen());

        ctx.message_box.confirm();
        assert!(!ctx.character.borrow().is_frozen());
    }

    #[test]
    fn door_transition_queues_a_map_change_and_shuts_the_door() {
        let (_display, ctx) = context();
        let tiles = FarmTiles::load(&ImageLoader::new("no/assets"), CELL).expect("tiles");
        let map = Map::new("yard", Size::new(3, 3), CELL, &["walls"]).expect("map");
        let layer = map.layer("walls").expect("walls");
        let cell = Point::new(1, 0);
        layer
            .borrow_mut()
            .update_cell(cell, tiles.drawable("door").expect("door"));

        let door = Door {
            cell,
            layer: "walls".to_string(),
            facing: Direction::Up,
            leads_to: "house".to_string(),
            arrive_at: Point::new(2, 2),
            arrive_facing: Direction::Down,
        };
        door_transition(&ctx, Rc::clone(&layer), door).start();
        assert!(ctx.character.borrow().is_frozen());

        run(&ctx, 3);
        let frame = |layer: &GridLayerRef| {
            let grid = layer.borrow();
            let id = grid
                .get_cell(cell)
                .and_then(|c| c.content())
                .map(Drawable::tile_id);
            id.and_then(|id| tiles.registry().key_of(id).map(str::to_string))
        };
        assert_eq!(frame(&layer).as_deref(), Some("door/3"));

        run(&ctx, 6);
        assert_eq!(ctx.curtain.alpha(), 255);
        let command = ctx.commands.borrow_mut().pop_front().expect("command");
        let FarmCommand::ChangeMap { map, arrive_at, done, .. } = command;
        assert_eq!(map, "house");
        assert_eq!(arrive_at, Point::new(2, 2));

        done.invoke();
        assert_eq!(frame(&layer).as_deref(), Some("door/0"));
        run(&ctx, 5);
        assert_eq!(ctx.curtain.alpha(), 0);
        assert!(!ctx.character.borrow().is_frozen());
    }

    #[test]
    fn welcome_unfreezes_after_confirm() {
        let (_display, ctx) = context();
        welcome(&ctx).start();
        assert!(ctx.message_box.is_displayed());
        ctx.message_box.confirm();
        ctx.message_box.confirm();
        assert!(!ctx.message_box.is_displayed());
        assert!(!ctx.character.borrow().is_frozen());
    }
}
