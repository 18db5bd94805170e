//! Unit tests for tsim-kernel.

use tsim_core::{GuardId, LatchId, SimTime};

use crate::{Context, KernelError, Process, Scheduler, Yield};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// World for scripted processes: `(who:what, time)` marks in resumption order.
type Log = Vec<(String, f64)>;

#[derive(Clone, Debug)]
enum Op {
    Wait(f64),
    WaitOn(LatchId),
    Acquire(GuardId, f64),
    Release(GuardId, f64),
    Fire(LatchId),
    Mark(&'static str),
}

/// A process that executes a fixed list of operations.
struct Script {
    name: &'static str,
    ops:  Vec<Op>,
    pc:   usize,
}

fn script(name: &'static str, ops: Vec<Op>) -> Box<Script> {
    Box::new(Script { name, ops, pc: 0 })
}

impl Process<Log, KernelError> for Script {
    fn resume(&mut self, log: &mut Log, cx: &mut Context<'_>) -> Result<Yield, KernelError> {
        while let Some(op) = self.ops.get(self.pc).cloned() {
            self.pc += 1;
            match op {
                Op::Wait(d) => return Ok(Yield::Timeout(d)),
                Op::WaitOn(l) => return Ok(Yield::Latch(l)),
                Op::Acquire(g, a) => return Ok(Yield::Acquire { guard: g, amount: a }),
                Op::Release(g, a) => cx.release(g, a)?,
                Op::Fire(l) => cx.fire(l)?,
                Op::Mark(m) => log.push((format!("{}:{m}", self.name), cx.now().0)),
            }
        }
        Ok(Yield::Done)
    }

    fn label(&self) -> String {
        self.name.to_string()
    }
}

fn marks(log: &Log) -> Vec<&str> {
    log.iter().map(|(m, _)| m.as_str()).collect()
}

fn time_of(log: &Log, mark: &str) -> f64 {
    log.iter().find(|(m, _)| m == mark).map(|&(_, t)| t).unwrap()
}

// ── Clock and ordering ────────────────────────────────────────────────────────

#[cfg(test)]
mod clock {
    use super::*;

    #[test]
    fn timeouts_advance_the_clock() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::Wait(2.5), Op::Mark("x"), Op::Wait(10.0), Op::Mark("y")]));
        let mut log = Log::new();
        let stats = s.run(&mut log, None).unwrap();
        assert_eq!(log, vec![("a:x".into(), 2.5), ("a:y".into(), 12.5)]);
        assert_eq!(stats.end_time, SimTime(12.5));
        assert_eq!(stats.live, 0);
        assert!(!stats.truncated);
    }

    #[test]
    fn same_time_resumes_in_registration_order() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        for name in ["a", "b", "c"] {
            s.spawn(script(name, vec![Op::Wait(1.0), Op::Mark("t")]));
        }
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(marks(&log), vec!["a:t", "b:t", "c:t"]);
    }

    #[test]
    fn zero_timeout_yields_to_peers() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::Mark("1"), Op::Wait(0.0), Op::Mark("2")]));
        s.spawn(script("b", vec![Op::Mark("1")]));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(marks(&log), vec!["a:1", "b:1", "a:2"]);
    }

    #[test]
    fn until_bound_truncates_and_can_resume() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::Wait(5.0), Op::Mark("x"), Op::Wait(5.0), Op::Mark("y")]));
        let mut log = Log::new();
        let stats = s.run(&mut log, Some(SimTime(7.0))).unwrap();
        assert!(stats.truncated);
        assert_eq!(stats.end_time, SimTime(7.0));
        assert_eq!(stats.live, 1);
        assert_eq!(marks(&log), vec!["a:x"]);

        s.run(&mut log, None).unwrap();
        assert_eq!(marks(&log), vec!["a:x", "a:y"]);
    }

    #[test]
    fn negative_delay_is_an_error() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::Wait(-1.0)]));
        let err = s.run(&mut Log::new(), None).unwrap_err();
        assert!(matches!(err, KernelError::InvalidDelay { .. }));
    }

    #[test]
    fn nan_delay_is_an_error() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::Wait(f64::NAN)]));
        assert!(s.run(&mut Log::new(), None).is_err());
    }
}

// ── Latches ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod latches {
    use super::*;

    #[test]
    fn fire_wakes_waiters_in_wait_order() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let go = s.new_latch();
        s.spawn(script("b", vec![Op::Wait(1.0), Op::WaitOn(go), Op::Mark("go")]));
        s.spawn(script("a", vec![Op::WaitOn(go), Op::Mark("go")]));
        s.spawn(script("f", vec![Op::Wait(3.0), Op::Fire(go)]));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        // `a` parked at t=0, `b` at t=1.
        assert_eq!(marks(&log), vec!["a:go", "b:go"]);
        assert_eq!(time_of(&log, "a:go"), 3.0);
        assert_eq!(s.latch(go).unwrap().fired_at(), Some(SimTime(3.0)));
    }

    #[test]
    fn waiting_on_fired_latch_resumes_immediately() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let l = s.new_latch();
        s.fire(l).unwrap();
        s.spawn(script("a", vec![Op::Wait(4.0), Op::WaitOn(l), Op::Mark("x")]));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(time_of(&log, "a:x"), 4.0);
    }

    #[test]
    fn double_fire_is_an_error() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let l = s.new_latch();
        s.fire(l).unwrap();
        assert!(matches!(s.fire(l), Err(KernelError::LatchAlreadyFired(_))));
    }

    #[test]
    fn unknown_latch_is_an_error() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        s.spawn(script("a", vec![Op::WaitOn(LatchId(9))]));
        assert!(matches!(s.run(&mut Log::new(), None), Err(KernelError::UnknownLatch(_))));
    }
}

// ── Guards under the scheduler ────────────────────────────────────────────────

#[cfg(test)]
mod guarded {
    use super::*;

    fn traverse(name: &'static str, g: GuardId, amount: f64, hold: f64) -> Box<Script> {
        script(
            name,
            vec![
                Op::Acquire(g, amount),
                Op::Mark("in"),
                Op::Wait(hold),
                Op::Mark("out"),
                Op::Release(g, amount),
            ],
        )
    }

    #[test]
    fn contention_delays_second_entry() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let edge = s.new_guard(Some(100.0));
        s.spawn(traverse("a", edge, 60.0, 10.0));
        s.spawn(traverse("b", edge, 60.0, 10.0));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(time_of(&log, "a:in"), 0.0);
        assert_eq!(time_of(&log, "b:in"), 10.0);
        assert!(time_of(&log, "b:in") >= time_of(&log, "a:out"));
        let g = s.guard(edge).unwrap();
        assert_eq!(g.peak_occupancy(), 60.0);
        assert_eq!(g.occupancy(), 0.0);
        assert_eq!(g.admissions(), 2);
    }

    #[test]
    fn fitting_requests_share() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let edge = s.new_guard(Some(100.0));
        s.spawn(traverse("a", edge, 50.0, 10.0));
        s.spawn(traverse("b", edge, 50.0, 10.0));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(time_of(&log, "b:in"), 0.0);
        assert_eq!(s.guard(edge).unwrap().peak_occupancy(), 100.0);
    }

    #[test]
    fn smaller_later_request_does_not_overtake() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let edge = s.new_guard(Some(100.0));
        s.spawn(traverse("a", edge, 60.0, 10.0));
        s.spawn(traverse("big", edge, 80.0, 10.0));
        s.spawn(traverse("small", edge, 30.0, 10.0));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        // `small` would fit next to `a`, but `big` asked first.
        assert_eq!(time_of(&log, "big:in"), 10.0);
        assert_eq!(time_of(&log, "small:in"), 20.0);
    }

    #[test]
    fn oversized_request_runs_alone() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let edge = s.new_guard(Some(1.0));
        s.spawn(traverse("a", edge, 0.5, 5.0));
        s.spawn(traverse("huge", edge, 3.0, 5.0));
        s.spawn(traverse("c", edge, 0.5, 5.0));
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert_eq!(time_of(&log, "huge:in"), 5.0);
        assert_eq!(time_of(&log, "c:in"), 10.0);
        assert_eq!(s.live_processes(), 0);
    }

    #[test]
    fn unlimited_guard_never_blocks() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let node = s.new_guard(None);
        for name in ["a", "b", "c"] {
            s.spawn(traverse(name, node, 1.0, 1.0));
        }
        let mut log = Log::new();
        s.run(&mut log, None).unwrap();
        assert!(["a:in", "b:in", "c:in"].iter().all(|m| time_of(&log, m) == 0.0));
    }

    #[test]
    fn negative_amount_is_an_error() {
        let mut s: Scheduler<Log, KernelError> = Scheduler::new();
        let g = s.new_guard(Some(1.0));
        s.spawn(script("a", vec![Op::Acquire(g, -1.0)]));
        assert!(matches!(s.run(&mut Log::new(), None), Err(KernelError::InvalidAmount { .. })));
    }
}

// ── CapacityGuard in isolation ────────────────────────────────────────────────

#[cfg(test)]
mod capacity_guard {
    use proptest::prelude::*;
    use tsim_core::ProcessId;

    use crate::{CapacityGuard, OCCUPANCY_EPS};

    #[test]
    #[should_panic(expected = "no holders")]
    fn release_without_holder_panics() {
        let mut g = CapacityGuard::new(Some(1.0));
        g.release(1.0);
    }

    #[test]
    fn queue_reports_waiting_processes() {
        let mut g = CapacityGuard::new(Some(1.0));
        assert!(g.request(ProcessId(0), 1.0));
        assert!(!g.request(ProcessId(1), 1.0));
        assert!(!g.request(ProcessId(2), 0.1));
        assert_eq!(g.waiting().collect::<Vec<_>>(), vec![ProcessId(1), ProcessId(2)]);
        assert_eq!(g.release(1.0), vec![ProcessId(1)]);
        assert_eq!(g.queue_len(), 1);
    }

    proptest! {
        /// Everyone requests up front, then holders leave oldest-first.
        /// Admission order must equal request order and occupancy must never
        /// exceed capacity unless a single oversized holder is alone.
        #[test]
        fn fifo_and_bounded(
            cap in 1.0f64..50.0,
            amounts in prop::collection::vec(0.1f64..60.0, 1..40),
        ) {
            let mut g = CapacityGuard::new(Some(cap));
            let mut admitted: Vec<(u32, f64)> = Vec::new();
            for (i, &a) in amounts.iter().enumerate() {
                if g.request(ProcessId(i as u32), a) {
                    admitted.push((i as u32, a));
                }
            }
            let mut next_release = 0;
            while next_release < admitted.len() {
                prop_assert!(g.occupancy() <= cap + OCCUPANCY_EPS || g.holders() == 1);
                let (_, a) = admitted[next_release];
                next_release += 1;
                for pid in g.release(a) {
                    admitted.push((pid.0, amounts[pid.index()]));
                }
            }
            let order: Vec<u32> = admitted.iter().map(|&(p, _)| p).collect();
            let expected: Vec<u32> = (0..amounts.len() as u32).collect();
            prop_assert_eq!(order, expected);
            prop_assert_eq!(g.holders(), 0);
            prop_assert_eq!(g.occupancy(), 0.0);
        }
    }
}
