use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Continuation = Box<dyn FnOnce()>;

/// One-shot signal that resumes whoever registered a continuation on it.
///
/// Clones share the same slot: the producer of an asynchronous step keeps
/// one clone and invokes it when the work completes, the consumer (usually a
/// [`Sequencer`](super::Sequencer)) registers itself on another.
///
/// `invoke` takes the continuation out before calling it, so invoking twice
/// runs it once. Setting twice keeps the last continuation.
#[derive(Clone, Default)]
pub struct ContinuationHandle {
    slot: Rc<RefCell<Option<Continuation>>>,
}

impl ContinuationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_continuation(&self, continuation: impl FnOnce() + 'static) {
        *self.slot.borrow_mut() = Some(Box::new(continuation));
    }

    pub fn invoke(&self) {
        // Release the borrow before running: the continuation may re-arm this handle.
        let continuation = self.slot.borrow_mut().take();
        if let Some(continuation) = continuation {
            continuation();
        }
    }

    /// True while a continuation is registered and not yet invoked.
    pub fn is_armed(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Drops any registered continuation without running it.
    pub fn reset(&self) {
        self.slot.borrow_mut().take();
    }

    pub fn ptr_eq(&self, other: &ContinuationHandle) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for ContinuationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationHandle")
            .field("armed", &self.is_armed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn invoke_without_continuation_is_noop() {
        let handle = ContinuationHandle::new();
        handle.invoke();
        assert!(!handle.is_armed());
    }

    #[test]
    fn invoke_runs_continuation_once() {
        let handle = ContinuationHandle::new();
        let runs = Rc::new(Cell::new(0));
        let sink = Rc::clone(&runs);
        handle.set_continuation(move || sink.set(sink.get() + 1));
        assert!(handle.is_armed());

        handle.invoke();
        handle.invoke();

        assert_eq!(runs.get(), 1);
        assert!(!handle.is_armed());
    }

    #[test]
    fn second_set_overwrites_first() {
        let handle = ContinuationHandle::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&log);
        let second = Rc::clone(&log);
        handle.set_continuation(move || first.borrow_mut().push("first"));
        handle.set_continuation(move || second.borrow_mut().push("second"));

        handle.invoke();

        assert_eq!(*log.borrow(), vec!["second"]);
    }

    #[test]
    fn clones_share_the_slot() {
        let producer = ContinuationHandle::new();
        let consumer = producer.clone();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        consumer.set_continuation(move || flag.set(true));

        producer.invoke();

        assert!(ran.get());
        assert!(producer.ptr_eq(&consumer));
    }

    #[test]
    fn continuation_may_rearm_its_own_handle() {
        let handle = ContinuationHandle::new();
        let inner = handle.clone();
        handle.set_continuation(move || inner.set_continuation(|| {}));

        handle.invoke();

        assert!(handle.is_armed());
    }

    #[test]
    fn reset_discards_without_running() {
        let handle = ContinuationHandle::new();
        let ran = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ran);
        handle.set_continuation(move || flag.set(true));

        handle.reset();
        handle.invoke();

        assert!(!ran.get());
    }
}
