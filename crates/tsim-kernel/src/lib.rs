//! `tsim-kernel`: the discrete-event substrate of the `tsim` fleet simulator.
//!
//! A [`Scheduler`] owns one virtual clock and a set of boxed [`Process`]es.
//! Each process is an explicit state machine that runs until it returns a
//! [`Yield`] naming what it waits for next.  There are exactly three ways to
//! wait:
//!
//! | Yield                | Resumes when                                          |
//! |----------------------|-------------------------------------------------------|
//! | `Timeout(d)`         | the clock reaches `now + d`                           |
//! | `Latch(id)`          | the one-shot [`Latch`] fires                          |
//! | `Acquire{guard, n}`  | the FIFO [`CapacityGuard`] admits `n` units           |
//!
//! Everything runs on a single thread.  Ties at the same timestamp resume in
//! the order they became runnable, so identical inputs always produce an
//! identical resumption sequence.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let mut sched: Scheduler<World, MyError> = Scheduler::new();
//! let go = sched.new_latch();
//! let road = sched.new_guard(Some(100.0));
//! sched.spawn(Box::new(Car::new(go, road)));
//! sched.fire(go)?;
//! let stats = sched.run(&mut world, None)?;
//! ```

pub mod error;
pub mod guard;
pub mod latch;
pub mod process;
pub mod scheduler;

#[cfg(test)]
mod tests;

pub use error::{KernelError, KernelResult};
pub use guard::{CapacityGuard, OCCUPANCY_EPS};
pub use latch::Latch;
pub use process::{Context, Process, Yield};
pub use scheduler::{RunStats, Scheduler};
