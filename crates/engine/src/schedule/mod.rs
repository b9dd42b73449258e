mod scheduler;
mod timer;

pub use scheduler::{Scheduler, TimerHandle, TimerId};
pub use timer::{ScheduleError, Timer, TimerCallback, TimerKind};
