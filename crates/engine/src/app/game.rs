use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compositor::{Display, Image};
use crate::config::Settings;
use crate::schedule::Scheduler;

use super::Key;

pub type GameError = Box<dyn Error + Send + Sync + 'static>;

/// Hooks the host calls on the game, all on the loop thread.
pub trait Game {
    fn load(&mut self, ctx: &mut EngineContext) -> Result<(), GameError>;
    /// Runs after due timers have fired for this frame.
    fn update(&mut self, _dt: Duration, _ctx: &mut EngineContext) {}
    fn key_down(&mut self, _key: Key, _ctx: &mut EngineContext) {}
    fn key_up(&mut self, _key: Key, _ctx: &mut EngineContext) {}
    /// Last chance to touch layers before the display composites them.
    fn before_render(&mut self, _ctx: &mut EngineContext) {}
    fn shutdown(&mut self, _ctx: &mut EngineContext) {}
}

/// Engine state handed to every [`Game`] hook.
#[derive(Debug)]
pub struct EngineContext {
    settings: Settings,
    asset_root: PathBuf,
    scheduler: Scheduler,
    display: Display,
    quit_requested: bool,
}

impl EngineContext {
    pub fn new(settings: Settings, asset_root: PathBuf) -> Self {
        let display = Display::new(settings.display_size(), settings.background);
        Self {
            settings,
            asset_root,
            scheduler: Scheduler::new(),
            display,
            quit_requested: false,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn asset_root(&self) -> &Path {
        &self.asset_root
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display {
        &mut self.display
    }

    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// One tick: fire due timers, let the game react, composite. Returns
    /// the number of timer callbacks fired.
    pub fn step_frame(&mut self, game: &mut dyn Game, dt: Duration) -> u32 {
        let fires = self.scheduler.advance(dt);
        game.update(dt, self);
        game.before_render(self);
        self.display.render();
        fires
    }

    pub fn frame(&self) -> &Image {
        self.display.frame()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::compositor::Layer;
    use crate::geometry::{Point, Size};

    const RED: [u8; 4] = [255, 0, 0, 255];

    #[derive(Default)]
    struct RecordingGame {
        calls: Rc<RefCell<Vec<String>>>,
        layer: Option<Rc<RefCell<Layer>>>,
    }

    impl Game for RecordingGame {
        fn load(&mut self, ctx: &mut EngineContext) -> Result<(), GameError> {
            let layer = Rc::new(RefCell::new(Layer::new(Size::new(2, 2))));
            let shared = Rc::clone(&layer);
            ctx.display_mut().append_layer("paint", shared);
            self.layer = Some(Rc::clone(&layer));

            let calls = Rc::clone(&self.calls);
            ctx.scheduler().register(10.0, 2, move |count| {
                calls.borrow_mut().push(format!("timer:{count}"));
                layer.borrow_mut().fill(RED);
            })?;
            Ok(())
        }

        fn update(&mut self, _dt: Duration, _ctx: &mut EngineContext) {
            self.calls.borrow_mut().push("update".to_string());
        }

        fn key_down(&mut self, key: Key, ctx: &mut EngineContext) {
            if key == Key::Quit {
                ctx.request_quit();
            }
        }

        fn before_render(&mut self, _ctx: &mut EngineContext) {
            self.calls.borrow_mut().push("before_render".to_string());
        }
    }

    fn context() -> EngineContext {
        let settings = Settings {
            grid_size: Size::new(2, 2),
            cell_size: Size::new(1, 1),
            background: [0, 0, 0, 255],
            ..Settings::default()
        };
        EngineContext::new(settings, PathBuf::from("assets"))
    }

    #[test]
    fn display_matches_settings() {
        let ctx = context();
        assert_eq!(ctx.display().size(), Size::new(2, 2));
        assert_eq!(ctx.display().background(), [0, 0, 0, 255]);
    }

    #[test]
    fn step_frame_fires_timers_before_update_and_render() {
        let mut ctx = context();
        let mut game = RecordingGame::default();
        game.load(&mut ctx).expect("load");

        let fires = ctx.step_frame(&mut game, Duration::from_millis(50));
        assert_eq!(fires, 0);
        assert_eq!(ctx.frame().pixel(Point::new(0, 0)), Some([0, 0, 0, 255]));

        let fires = ctx.step_frame(&mut game, Duration::from_millis(50));
        assert_eq!(fires, 1);
        assert_eq!(ctx.frame().pixel(Point::new(1, 1)), Some(RED));
        assert_eq!(
            *game.calls.borrow(),
            vec![
                "update",
                "before_render",
                "timer:1",
                "update",
                "before_render"
            ]
        );
    }

    #[test]
    fn game_can_request_quit() {
        let mut ctx = context();
        let mut game = RecordingGame::default();
        assert!(!ctx.quit_requested());
        game.key_down(Key::Quit, &mut ctx);
        assert!(ctx.quit_requested());
    }
}
