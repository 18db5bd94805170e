//! One-shot broadcast latch.
//!
//! A latch starts unfired.  Processes that wait on it are parked in the
//! order they started waiting.  Firing it wakes every parked process at the
//! current time, in that order; processes that wait after it has fired
//! resume immediately.  A latch cannot be reset or fired twice.

use tsim_core::{ProcessId, SimTime};

#[derive(Clone, Debug, Default)]
pub struct Latch {
    fired_at: Option<SimTime>,
    waiters:  Vec<ProcessId>,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fired(&self) -> bool {
        self.fired_at.is_some()
    }

    /// Time at which the latch was fired, if it has been.
    pub fn fired_at(&self) -> Option<SimTime> {
        self.fired_at
    }

    /// Park `pid` on the latch.  Returns `true` if the latch has already
    /// fired and the process should resume immediately.
    pub(crate) fn wait(&mut self, pid: ProcessId) -> bool {
        if self.is_fired() {
            return true;
        }
        self.waiters.push(pid);
        false
    }

    /// Fire the latch and hand back the parked processes.  Returns `None` if
    /// it had already fired.
    pub(crate) fn fire(&mut self, now: SimTime) -> Option<Vec<ProcessId>> {
        if self.is_fired() {
            return None;
        }
        self.fired_at = Some(now);
        Some(std::mem::take(&mut self.waiters))
    }
}
