use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, warn};

use super::timer::{ScheduleError, Timer, TimerControl, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Handle returned by registration. Cloning it does not clone the timer.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    id: TimerId,
    control: Rc<TimerControl>,
}

impl TimerHandle {
    pub fn id(&self) -> TimerId {
        self.id
    }

    /// False after removal or after a one-shot timer finished.
    pub fn is_active(&self) -> bool {
        self.control.is_live()
    }

    pub fn is_paused(&self) -> bool {
        self.control.is_paused()
    }
}

struct TimerSlot {
    id: TimerId,
    control: Rc<TimerControl>,
    timer: RefCell<Timer>,
}

#[derive(Default)]
struct SchedulerState {
    next_id: u64,
    slots: Vec<Rc<TimerSlot>>,
}

/// Owns every active [`Timer`] and advances them once per tick.
///
/// Cheap to clone; clones share the same timer set, so timer callbacks can
/// hold a clone to register or remove timers while a pass is running.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repeating timer.
    pub fn register(
        &self,
        rate: f64,
        period_count: u32,
        callback: impl FnMut(u32) + 'static,
    ) -> Result<TimerHandle, ScheduleError> {
        let timer = Timer::new(rate, period_count, TimerKind::Repeating, callback)?;
        Ok(self.insert(timer))
    }

    /// Registers a timer that removes itself after count `period_count - 1`.
    pub fn register_once(
        &self,
        rate: f64,
        period_count: u32,
        callback: impl FnMut(u32) + 'static,
    ) -> Result<TimerHandle, ScheduleError> {
        let timer = Timer::new(rate, period_count, TimerKind::OneShot, callback)?;
        Ok(self.insert(timer))
    }

    /// Runs `callback` once, `after` from now.
    pub fn delay(
        &self,
        after: Duration,
        callback: impl FnOnce() + 'static,
    ) -> Result<TimerHandle, ScheduleError> {
        let mut pending = Some(callback);
        let timer = Timer::with_interval(after, 2, TimerKind::OneShot, move |count| {
            if count == 1 {
                if let Some(callback) = pending.take() {
                    callback();
                }
            }
        })?;
        Ok(self.insert(timer))
    }

    /// Adds an already built timer.
    pub fn insert(&self, timer: Timer) -> TimerHandle {
        let control = timer.control();
        let mut state = self.state.borrow_mut();
        let id = TimerId(state.next_id);
        state.next_id = state.next_id.saturating_add(1);
        state.slots.push(Rc::new(TimerSlot {
            id,
            control: Rc::clone(&control),
            timer: RefCell::new(timer),
        }));
        debug!(
            timer = id.0,
            active_timers = state.slots.len(),
            "timer_registered"
        );
        TimerHandle { id, control }
    }

    /// Removing an unknown or already finished timer is a no-op.
    pub fn remove(&self, handle: &TimerHandle) {
        handle.control.cancel();
        let mut state = self.state.borrow_mut();
        let before = state.slots.len();
        state.slots.retain(|slot| slot.id != handle.id);
        if state.slots.len() != before {
            debug!(timer = handle.id.0, "timer_removed");
        }
    }

    pub fn pause(&self, handle: &TimerHandle) {
        handle.control.set_paused(true);
    }

    pub fn resume(&self, handle: &TimerHandle) {
        handle.control.set_paused(false);
    }

    /// Advances every timer registered before this call, in registration
    /// order. Timers registered by callbacks during the pass wait for the
    /// next call; timers removed during the pass are skipped immediately.
    /// Returns the number of callbacks fired.
    pub fn advance(&self, dt: Duration) -> u32 {
        let snapshot: Vec<Rc<TimerSlot>> = self.state.borrow().slots.clone();
        let mut fired = 0u32;
        for slot in &snapshot {
            if !slot.control.is_live() || slot.control.is_paused() {
                continue;
            }
            let Ok(mut timer) = slot.timer.try_borrow_mut() else {
                warn!(timer = slot.id.0, "timer_reentrant_advance_skipped");
                continue;
            };
            fired = fired.saturating_add(timer.advance(dt));
        }

        let mut state = self.state.borrow_mut();
        let before = state.slots.len();
        state.slots.retain(|slot| slot.control.is_live());
        let finished = before - state.slots.len();
        if finished > 0 {
            debug!(finished, remaining = state.slots.len(), "timers_pruned");
        }
        fired
    }

    pub fn contains(&self, handle: &TimerHandle) -> bool {
        self.state
            .borrow()
            .slots
            .iter()
            .any(|slot| slot.id == handle.id)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancels every timer, e.g. when tearing a scene down.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        for slot in &state.slots {
            slot.control.cancel();
        }
        state.slots.clear();
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let active = self.state.try_borrow().map(|state| state.slots.len()).ok();
        f.debug_struct("Scheduler")
            .field("active_timers", &active)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        (Rc::clone(&count), count)
    }

    #[test]
    fn end_to_end_rate_ten_period_five() {
        let scheduler = Scheduler::new();
        let (fired, sink) = counter();
        scheduler
            .register(10.0, 5, move |_| sink.set(sink.get() + 1))
            .expect("register");

        scheduler.advance(Duration::from_millis(500));

        assert_eq!(fired.get(), 5);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn removed_timer_never_fires_again() {
        let scheduler = Scheduler::new();
        let (fired, sink) = counter();
        let handle = scheduler
            .register(10.0, 5, move |_| sink.set(sink.get() + 1))
            .expect("register");

        scheduler.advance(Duration::from_millis(200));
        let before = fired.get();
        scheduler.remove(&handle);
        scheduler.advance(Duration::from_secs(60));

        assert_eq!(fired.get(), before);
        assert!(!handle.is_active());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn remove_is_idempotent() {
        let scheduler = Scheduler::new();
        let handle = scheduler.register(1.0, 1, |_| {}).expect("register");
        scheduler.remove(&handle);
        scheduler.remove(&handle);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn timer_removing_itself_stops_catching_up() {
        let scheduler = Scheduler::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        let own_handle: Rc<RefCell<Option<TimerHandle>>> = Rc::new(RefCell::new(None));

        let sink = Rc::clone(&fired);
        let scheduler_for_cb = scheduler.clone();
        let handle_for_cb = Rc::clone(&own_handle);
        let handle = scheduler
            .register(10.0, 10, move |count| {
                sink.borrow_mut().push(count);
                if count == 2 {
                    if let Some(handle) = handle_for_cb.borrow().as_ref() {
                        scheduler_for_cb.remove(handle);
                    }
                }
            })
            .expect("register");
        *own_handle.borrow_mut() = Some(handle);

        scheduler.advance(Duration::from_millis(900));

        assert_eq!(*fired.borrow(), vec![1, 2]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn timer_registered_during_pass_starts_next_tick() {
        let scheduler = Scheduler::new();
        let (inner_fired, inner_sink) = counter();
        let scheduler_for_cb = scheduler.clone();
        let spawned = Rc::new(Cell::new(false));
        let spawned_flag = Rc::clone(&spawned);

        scheduler
            .register(10.0, 100, move |_| {
                if spawned_flag.replace(true) {
                    return;
                }
                let sink = Rc::clone(&inner_sink);
                scheduler_for_cb
                    .register(1000.0, 100, move |_| sink.set(sink.get() + 1))
                    .expect("inner register");
            })
            .expect("register");

        scheduler.advance(Duration::from_millis(100));
        assert!(spawned.get());
        assert_eq!(inner_fired.get(), 0);
        assert_eq!(scheduler.len(), 2);

        scheduler.advance(Duration::from_millis(1));
        assert_eq!(inner_fired.get(), 1);
    }

    #[test]
    fn timers_fire_in_registration_order() {
        let scheduler = Scheduler::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let sink = Rc::clone(&order);
            scheduler
                .register(10.0, 2, move |_| sink.borrow_mut().push(name))
                .expect("register");
        }

        scheduler.advance(Duration::from_millis(100));

        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn one_shot_is_pruned_after_last_count() {
        let scheduler = Scheduler::new();
        let (fired, sink) = counter();
        let handle = scheduler
            .register_once(10.0, 3, move |_| sink.set(sink.get() + 1))
            .expect("register");

        scheduler.advance(Duration::from_millis(100));
        assert!(scheduler.contains(&handle));
        scheduler.advance(Duration::from_millis(100));

        assert_eq!(fired.get(), 2);
        assert!(!scheduler.contains(&handle));
        assert!(!handle.is_active());
    }

    #[test]
    fn delay_runs_callback_once_after_duration() {
        let scheduler = Scheduler::new();
        let (fired, sink) = counter();
        let delay = Duration::from_millis(1500);
        scheduler
            .delay(delay, move || sink.set(sink.get() + 1))
            .expect("delay");

        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(fired.get(), 0);
        scheduler.advance(Duration::from_millis(500));
        assert_eq!(fired.get(), 1);
        assert!(scheduler.is_empty());

        scheduler.advance(Duration::from_secs(10));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn zero_delay_is_rejected() {
        let scheduler = Scheduler::new();
        let result = scheduler.delay(Duration::ZERO, || {});
        assert!(matches!(result, Err(ScheduleError::ZeroDelay)));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn paused_timer_is_skipped_until_resumed() {
        let scheduler = Scheduler::new();
        let (fired, sink) = counter();
        let handle = scheduler
            .register(10.0, 5, move |_| sink.set(sink.get() + 1))
            .expect("register");

        scheduler.pause(&handle);
        scheduler.advance(Duration::from_millis(400));
        assert_eq!(fired.get(), 0);
        assert!(handle.is_paused());

        scheduler.resume(&handle);
        scheduler.advance(Duration::from_millis(100));
        assert_eq!(fired.get(), 1);
    }
}
