use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::ContinuationHandle;

/// What a step reports back to its [`Sequencer`].
#[derive(Debug)]
pub enum StepResult {
    /// Finished synchronously; the next step runs right away.
    Done,
    /// Finishes later, when the handle is invoked.
    Pending(ContinuationHandle),
}

impl From<ContinuationHandle> for StepResult {
    fn from(handle: ContinuationHandle) -> Self {
        StepResult::Pending(handle)
    }
}

impl From<Option<ContinuationHandle>> for StepResult {
    fn from(handle: Option<ContinuationHandle>) -> Self {
        handle.map_or(StepResult::Done, StepResult::Pending)
    }
}

pub type Step = Box<dyn FnOnce() -> StepResult>;

pub fn step(f: impl FnOnce() -> StepResult + 'static) -> Step {
    Box::new(f)
}

/// Runs steps in order, suspending on every pending step until its handle
/// is invoked. Cheap to clone; clones drive the same queue.
///
/// A pending handle that is never invoked stalls the remaining steps
/// indefinitely. Dialogue boxes rely on this to hold a script until the
/// player dismisses them.
#[derive(Clone, Default)]
pub struct Sequencer {
    queue: Rc<RefCell<VecDeque<Step>>>,
}

impl Sequencer {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            queue: Rc::new(RefCell::new(steps.into_iter().collect())),
        }
    }

    pub fn push(&self, step: Step) {
        self.queue.borrow_mut().push_back(step);
    }

    pub fn push_fn(&self, f: impl FnOnce() -> StepResult + 'static) {
        self.push(Box::new(f));
    }

    pub fn start(&self) {
        self.advance();
    }

    /// Runs steps until one suspends or the queue drains.
    pub fn advance(&self) {
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(step) = next else {
                trace!("sequence_finished");
                return;
            };

            match step() {
                StepResult::Done => continue,
                StepResult::Pending(handle) => {
                    let resume = self.clone();
                    handle.set_continuation(move || resume.advance());
                    trace!(remaining = self.len(), "sequence_suspended");
                    return;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// No steps left to start. The last step may still be pending.
    pub fn is_finished(&self) -> bool {
        self.is_empty()
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequencer")
            .field("pending_steps", &self.len())
            .finish()
    }
}
