use std::cell::{Cell, RefCell};
use std::rc::Rc;

use farmstead_engine::{
    Composite, ContinuationHandle, Display, Layer, LayerRef, ScheduleError, Scheduler, TimerHandle,
};
use tracing::debug;

pub(crate) const LAYER: &str = "curtain";

/// Alpha steps per second.
const FADE_RATE: f64 = 10.0;

/// Full-screen black layer whose alpha is driven by fade timers.
#[derive(Debug)]
struct CurtainLayer {
    layer: Layer,
    alpha: Rc<Cell<u8>>,
    painted: Option<u8>,
}

impl Composite for CurtainLayer {
    fn layer(&self) -> &Layer {
        &self.layer
    }

    fn layer_mut(&mut self) -> &mut Layer {
        &mut self.layer
    }

    fn refresh(&mut self) {
        let alpha = self.alpha.get();
        if self.painted != Some(alpha) {
            self.layer.fill([0, 0, 0, alpha]);
            self.painted = Some(alpha);
        }
    }

    fn invalidate(&mut self) {
        self.painted = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fade {
    Out,
    In,
}

/// Fades the whole screen to black and back.
///
/// Each fade returns a [`ContinuationHandle`] invoked once the curtain is
/// fully closed or fully open. Starting a fade cancels the running one
/// without invoking its handle.
#[derive(Debug, Clone)]
pub(crate) struct Curtain {
    scheduler: Scheduler,
    alpha: Rc<Cell<u8>>,
    running: Rc<RefCell<Option<TimerHandle>>>,
}

impl Curtain {
    pub(crate) fn attach(display: &mut Display, scheduler: &Scheduler) -> Self {
        let alpha = Rc::new(Cell::new(0));
        let layer: LayerRef = Rc::new(RefCell::new(CurtainLayer {
            layer: Layer::new(display.size()),
            alpha: Rc::clone(&alpha),
            painted: None,
        }));
        display.append_layer(LAYER, layer);
        Self {
            scheduler: scheduler.clone(),
            alpha,
            running: Rc::new(RefCell::new(None)),
        }
    }

    #[cfg(test)]
    pub(crate) fn alpha(&self) -> u8 {
        self.alpha.get()
    }

    #[cfg(test)]
    pub(crate) fn is_ongoing(&self) -> bool {
        self.running
            .borrow()
            .as_ref()
            .is_some_and(TimerHandle::is_active)
    }

    pub(crate) fn fade_out(&self, speed: u8) -> Result<ContinuationHandle, ScheduleError> {
        self.fade(Fade::Out, speed)
    }

    pub(crate) fn fade_in(&self, speed: u8) -> Result<ContinuationHandle, ScheduleError> {
        self.fade(Fade::In, speed)
    }

    /// `speed` is the alpha change per step; the last step lands exactly on
    /// fully closed or fully open.
    fn fade(&self, fade: Fade, speed: u8) -> Result<ContinuationHandle, ScheduleError> {
        let previous = self.running.borrow_mut().take();
        if let Some(previous) = previous {
            self.scheduler.remove(&previous);
        }

        let speed = u32::from(speed.max(1));
        let steps = 255 / speed + 1;
        let done = ContinuationHandle::new();
        let alpha = Rc::clone(&self.alpha);
        let finished = done.clone();
        let timer = self.scheduler.register_once(FADE_RATE, steps, move |count| {
            let progress = if count == 0 || count + 1 >= steps {
                255
            } else {
                (count * speed).min(255)
            };
            let progress = progress as u8;
            alpha.set(match fade {
                Fade::Out => progress,
                Fade::In => 255 - progress,
            });
            if progress == 255 {
                debug!(fade = ?fade, "curtain_fade_finished");
                finished.invoke();
            }
        })?;
        *self.running.borrow_mut() = Some(timer);
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use farmstead_engine::{Point, Size};

    use super::*;

    const STEP: Duration = Duration::from_millis(100);

    fn setup() -> (Display, Scheduler, Curtain) {
        let mut display = Display::new(Size::new(4, 4), [255, 255, 255, 255]);
        let scheduler = Scheduler::new();
        let curtain = Curtain::attach(&mut display, &scheduler);
        (display, scheduler, curtain)
    }

    #[test]
    fn fade_out_reaches_black_and_signals() {
        let (mut display, scheduler, curtain) = setup();
        let done = curtain.fade_out(51).expect("fade");
        let signalled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&signalled);
        done.set_continuation(move || flag.set(true));

        scheduler.advance(STEP);
        assert_eq!(curtain.alpha(), 51);
        assert!(curtain.is_ongoing());
        for _ in 0..4 {
            scheduler.advance(STEP);
        }
        assert_eq!(curtain.alpha(), 255);
        assert!(signalled.get());
        assert!(!curtain.is_ongoing());

        let frame = display.render();
        assert_eq!(frame.pixel(Point::new(2, 2)), Some([0, 0, 0, 255]));
    }

    #[test]
    fn fade_in_opens_the_curtain() {
        let (_display, scheduler, curtain) = setup();
        curtain.fade_out(255).expect("fade out");
        scheduler.advance(STEP);
        assert_eq!(curtain.alpha(), 255);

        let done = curtain.fade_in(100).expect("fade in");
        let signalled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&signalled);
        done.set_continuation(move || flag.set(true));
        for _ in 0..3 {
            scheduler.advance(STEP);
        }
        assert_eq!(curtain.alpha(), 0);
        assert!(signalled.get());
    }

    #[test]
    fn starting_a_fade_cancels_the_running_one() {
        let (_display, scheduler, curtain) = setup();
        let first = curtain.fade_out(51).expect("first");
        let signalled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&signalled);
        first.set_continuation(move || flag.set(true));
        scheduler.advance(STEP);
        curtain.fade_in(51).expect("second");
        assert_eq!(scheduler.len(), 1);
        for _ in 0..6 {
            scheduler.advance(STEP);
        }
        assert_eq!(curtain.alpha(), 0);
        assert!(!signalled.get());
        assert!(first.is_armed());
    }
}
