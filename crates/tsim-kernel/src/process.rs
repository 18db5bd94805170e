//! The `Process` trait and the context handed to it on every resumption.

use tsim_core::{GuardId, LatchId, ProcessId, SimTime};

use crate::scheduler::Kernel;
use crate::{CapacityGuard, KernelResult};

// ── Yield ─────────────────────────────────────────────────────────────────────

/// What a process is waiting for when it returns control to the scheduler.
///
/// These are the only suspension points a process has.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Yield {
    /// Resume after `delay` units of virtual time.  `Timeout(0.0)` yields to
    /// every other process already runnable at the current time.
    Timeout(f64),

    /// Resume once the latch fires (immediately if it already has).
    Latch(LatchId),

    /// Resume once `amount` has been admitted by the guard.  The process
    /// holds the amount until it calls [`Context::release`].
    Acquire { guard: GuardId, amount: f64 },

    /// The process is finished and will never be resumed again.
    Done,
}

// ── Process ───────────────────────────────────────────────────────────────────

/// A resumable unit of simulated behavior.
///
/// A process is an explicit state machine: each call to `resume` runs it from
/// its current state up to its next suspension point and returns the
/// corresponding [`Yield`].  `W` is the shared world the process reads and
/// mutates; `E` is the error type of the embedding simulation.
pub trait Process<W, E> {
    fn resume(&mut self, world: &mut W, cx: &mut Context<'_>) -> Result<Yield, E>;

    /// Short name used in diagnostics.
    fn label(&self) -> String {
        String::from("process")
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Kernel services available to a process while it is running.
///
/// Releasing a guard or firing a latch never suspends the caller; any
/// processes woken as a consequence are queued behind everything already
/// runnable at the current time.
pub struct Context<'a> {
    pub(crate) pid:    ProcessId,
    pub(crate) kernel: &'a mut Kernel,
}

impl Context<'_> {
    #[inline]
    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    #[inline]
    pub fn pid(&self) -> ProcessId {
        self.pid
    }

    /// Release `amount` previously acquired from `guard`.
    pub fn release(&mut self, guard: GuardId, amount: f64) -> KernelResult<()> {
        self.kernel.release(guard, amount)
    }

    /// Fire a one-shot latch.
    pub fn fire(&mut self, latch: LatchId) -> KernelResult<()> {
        self.kernel.fire(latch)
    }

    pub fn is_fired(&self, latch: LatchId) -> KernelResult<bool> {
        self.kernel.latch(latch).map(|l| l.is_fired())
    }

    pub fn guard(&self, guard: GuardId) -> KernelResult<&CapacityGuard> {
        self.kernel.guard(guard)
    }
}
