use serde::{Deserialize, Serialize};

use super::mode::Mode;

/// What a display sink needs to render the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUpdate {
    pub mode: Mode,
    pub remaining_secs: u64,
    pub running: bool,
}

/// A finished interval. Produced after the transition has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    /// The mode that just ran out.
    pub previous: Mode,
    /// The mode the engine switched to.
    pub next: Mode,
    pub completed_focus_count: u64,
}

/// Callbacks invoked by [`TimerEngine`](super::TimerEngine).
pub trait TimerObserver {
    /// Mode, remaining time or running flag changed.
    fn display(&mut self, update: &DisplayUpdate);

    /// Called exactly once per zero-crossing.
    fn completed(&mut self, completion: &Completion);
}

impl TimerObserver for () {
    fn display(&mut self, _update: &DisplayUpdate) {}

    fn completed(&mut self, _completion: &Completion) {}
}

impl<O: TimerObserver + ?Sized> TimerObserver for Box<O> {
    fn display(&mut self, update: &DisplayUpdate) {
        (**self).display(update);
    }

    fn completed(&mut self, completion: &Completion) {
        (**self).completed(completion);
    }
}

impl<O: TimerObserver + ?Sized> TimerObserver for &mut O {
    fn display(&mut self, update: &DisplayUpdate) {
        (**self).display(update);
    }

    fn completed(&mut self, completion: &Completion) {
        (**self).completed(completion);
    }
}
