//! Continuation-passing step sequencing.
//!
//! There is no suspendable call stack here: "await this animation, then do
//! the next step" is expressed as a queue of steps, each of which either
//! finishes synchronously or hands back a [`ContinuationHandle`] that the
//! sequencer hooks itself onto.

mod continuation;
mod sequencer;

pub use continuation::ContinuationHandle;
pub use sequencer::{step, Sequencer, Step, StepResult};
