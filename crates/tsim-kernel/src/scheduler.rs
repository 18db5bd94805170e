//! The virtual-time scheduler.
//!
//! # Ready queue
//!
//! Runnable processes live in a `BTreeMap<(SimTime, u64), ProcessId>`.  The
//! `u64` is a monotonically increasing sequence number assigned when the
//! entry is pushed, so processes runnable at the same instant resume in the
//! order they became runnable.  Nothing else influences ordering: given the
//! same processes and the same decisions, every run resumes them in exactly
//! the same order.
//!
//! # Stepping
//!
//! [`Scheduler::step`] pops the earliest entry, advances the clock to its
//! time, resumes the process once, and acts on the returned [`Yield`]:
//!
//! | Yield                | Effect                                                   |
//! |----------------------|----------------------------------------------------------|
//! | `Timeout(d)`         | re-queue at `now + d`                                    |
//! | `Latch(l)`           | re-queue at `now` if fired, else park on the latch       |
//! | `Acquire{g, amount}` | re-queue at `now` if admitted, else join the guard queue |
//! | `Done`               | drop the process                                         |

use std::collections::BTreeMap;

use tracing::trace;
use tsim_core::{GuardId, LatchId, ProcessId, SimTime};

use crate::{CapacityGuard, Context, KernelError, KernelResult, Latch, Process, Yield};

// ── Kernel ────────────────────────────────────────────────────────────────────

/// Clock, ready queue, latches and guards: everything a running process may
/// touch through its [`Context`].
#[derive(Default)]
pub(crate) struct Kernel {
    pub(crate) now: SimTime,
    seq:            u64,
    ready:          BTreeMap<(SimTime, u64), ProcessId>,
    latches:        Vec<Latch>,
    guards:         Vec<CapacityGuard>,
}

impl Kernel {
    fn schedule(&mut self, at: SimTime, pid: ProcessId) {
        self.ready.insert((at, self.seq), pid);
        self.seq += 1;
    }

    pub(crate) fn latch(&self, id: LatchId) -> KernelResult<&Latch> {
        self.latches.get(id.index()).ok_or(KernelError::UnknownLatch(id))
    }

    pub(crate) fn guard(&self, id: GuardId) -> KernelResult<&CapacityGuard> {
        self.guards.get(id.index()).ok_or(KernelError::UnknownGuard(id))
    }

    fn guard_mut(&mut self, id: GuardId) -> KernelResult<&mut CapacityGuard> {
        self.guards.get_mut(id.index()).ok_or(KernelError::UnknownGuard(id))
    }

    pub(crate) fn fire(&mut self, id: LatchId) -> KernelResult<()> {
        let now = self.now;
        let latch = self.latches.get_mut(id.index()).ok_or(KernelError::UnknownLatch(id))?;
        let woken = latch.fire(now).ok_or(KernelError::LatchAlreadyFired(id))?;
        trace!(latch = id.0, woken = woken.len(), at = now.0, "latch fired");
        for pid in woken {
            self.schedule(now, pid);
        }
        Ok(())
    }

    pub(crate) fn release(&mut self, id: GuardId, amount: f64) -> KernelResult<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(KernelError::InvalidAmount { guard: id, amount });
        }
        let now = self.now;
        let admitted = self.guard_mut(id)?.release(amount);
        for pid in admitted {
            trace!(guard = id.0, pid = pid.0, at = now.0, "admitted from queue");
            self.schedule(now, pid);
        }
        Ok(())
    }
}

// ── RunStats ──────────────────────────────────────────────────────────────────

/// Summary of one [`Scheduler::run`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RunStats {
    /// Clock value when the run stopped.
    pub end_time: SimTime,
    /// Number of process resumptions performed.
    pub steps: u64,
    /// Processes that had not finished when the run stopped.
    pub live: usize,
    /// `true` if the run stopped at the time bound rather than running dry.
    pub truncated: bool,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// Single-threaded discrete-event scheduler over world type `W`.
pub struct Scheduler<W, E> {
    kernel:    Kernel,
    processes: Vec<Option<Box<dyn Process<W, E>>>>,
    live:      usize,
}

impl<W, E> Default for Scheduler<W, E> {
    fn default() -> Self {
        Self { kernel: Kernel::default(), processes: Vec::new(), live: 0 }
    }
}

impl<W, E: From<KernelError>> Scheduler<W, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.kernel.now
    }

    /// Register a process and make it runnable at the current time.
    pub fn spawn(&mut self, process: Box<dyn Process<W, E>>) -> ProcessId {
        let pid = ProcessId(self.processes.len() as u32);
        trace!(pid = pid.0, label = %process.label(), "spawn");
        self.processes.push(Some(process));
        self.live += 1;
        self.kernel.schedule(self.kernel.now, pid);
        pid
    }

    pub fn new_latch(&mut self) -> LatchId {
        self.kernel.latches.push(Latch::new());
        LatchId((self.kernel.latches.len() - 1) as u32)
    }

    /// Create a guard.  `None` means unlimited capacity.
    pub fn new_guard(&mut self, capacity: Option<f64>) -> GuardId {
        self.kernel.guards.push(CapacityGuard::new(capacity));
        GuardId((self.kernel.guards.len() - 1) as u32)
    }

    /// Fire a latch from outside any process.
    pub fn fire(&mut self, latch: LatchId) -> Result<(), E> {
        Ok(self.kernel.fire(latch)?)
    }

    pub fn latch(&self, id: LatchId) -> Option<&Latch> {
        self.kernel.latch(id).ok()
    }

    pub fn guard(&self, id: GuardId) -> Option<&CapacityGuard> {
        self.kernel.guard(id).ok()
    }

    pub fn guards(&self) -> &[CapacityGuard] {
        &self.kernel.guards
    }

    /// Time of the next runnable process, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.kernel.ready.keys().next().map(|&(t, _)| t)
    }

    /// Number of processes that have not yet returned [`Yield::Done`].
    pub fn live_processes(&self) -> usize {
        self.live
    }

    /// Resume the earliest runnable process once.
    ///
    /// Returns `Ok(false)` if nothing is runnable.
    pub fn step(&mut self, world: &mut W) -> Result<bool, E> {
        let Some(((at, _), pid)) = self.kernel.ready.pop_first() else {
            return Ok(false);
        };
        debug_assert!(at >= self.kernel.now, "clock moved backwards");
        self.kernel.now = at;

        let slot = self.processes.get_mut(pid.index()).ok_or(KernelError::UnknownProcess(pid))?;
        let mut process = slot.take().ok_or(KernelError::UnknownProcess(pid))?;

        let outcome = {
            let mut cx = Context { pid, kernel: &mut self.kernel };
            process.resume(world, &mut cx)
        };

        match outcome {
            Ok(Yield::Done) => {
                trace!(pid = pid.0, at = at.0, "done");
                self.live -= 1;
            }
            Ok(y) => {
                self.processes[pid.index()] = Some(process);
                self.suspend(pid, y)?;
            }
            Err(e) => {
                self.processes[pid.index()] = Some(process);
                return Err(e);
            }
        }
        Ok(true)
    }

    fn suspend(&mut self, pid: ProcessId, y: Yield) -> KernelResult<()> {
        let now = self.kernel.now;
        match y {
            Yield::Timeout(delay) => {
                if !delay.is_finite() || delay < 0.0 {
                    return Err(KernelError::InvalidDelay { pid, delay });
                }
                self.kernel.schedule(now + delay, pid);
            }
            Yield::Latch(id) => {
                let latch = self
                    .kernel
                    .latches
                    .get_mut(id.index())
                    .ok_or(KernelError::UnknownLatch(id))?;
                if latch.wait(pid) {
                    self.kernel.schedule(now, pid);
                }
            }
            Yield::Acquire { guard, amount } => {
                if !amount.is_finite() || amount < 0.0 {
                    return Err(KernelError::InvalidAmount { guard, amount });
                }
                if self.kernel.guard_mut(guard)?.request(pid, amount) {
                    self.kernel.schedule(now, pid);
                } else {
                    trace!(pid = pid.0, guard = guard.0, amount, "queued on guard");
                }
            }
            Yield::Done => {}
        }
        Ok(())
    }

    /// Run until nothing is runnable or the clock would pass `until`.
    ///
    /// Entries scheduled at or after `until` are left in the queue and the
    /// clock is set to `until`, so a run can be resumed later with a larger
    /// bound.
    pub fn run(&mut self, world: &mut W, until: Option<SimTime>) -> Result<RunStats, E> {
        let mut steps = 0u64;
        let mut truncated = false;
        while let Some(next) = self.peek_time() {
            if let Some(bound) = until {
                if next >= bound {
                    self.kernel.now = bound;
                    truncated = true;
                    break;
                }
            }
            self.step(world)?;
            steps += 1;
        }
        Ok(RunStats { end_time: self.kernel.now, steps, live: self.live, truncated })
    }
}
