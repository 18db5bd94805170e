//! `CapacityGuard`: FIFO-fair admission to a shared, capacity-bounded resource.
//!
//! # Admission rule
//!
//! A request for `amount` is admitted when no earlier request is still
//! waiting **and** `occupancy + amount <= capacity`.  Waiting requests form a
//! strict FIFO queue: on release the guard admits from the head of the queue
//! for as long as the head fits, then stops.  A smaller request behind a
//! blocked larger one therefore waits too, which is what keeps admission
//! order identical to request order.
//!
//! A request larger than the whole capacity is admitted once the guard has
//! no holders at all, and then holds the resource exclusively until it
//! releases.  Such requests never starve and never share.
//!
//! `capacity == None` makes the guard non-blocking; every request is
//! admitted immediately.
//!
//! Occupancy is an `f64` (edge occupancy is measured in vehicle lengths).
//! Comparisons use a small tolerance so that repeated add/subtract of
//! fractional lengths cannot drift a guard into refusing a request that fits.

use std::collections::VecDeque;

use tsim_core::ProcessId;

/// Absolute tolerance on occupancy comparisons.
pub const OCCUPANCY_EPS: f64 = 1e-9;

#[derive(Clone, Debug)]
pub struct CapacityGuard {
    capacity:   Option<f64>,
    occupancy:  f64,
    holders:    usize,
    waiters:    VecDeque<(ProcessId, f64)>,
    peak:       f64,
    admissions: u64,
}

impl CapacityGuard {
    pub fn new(capacity: Option<f64>) -> Self {
        Self {
            capacity,
            occupancy:  0.0,
            holders:    0,
            waiters:    VecDeque::new(),
            peak:       0.0,
            admissions: 0,
        }
    }

    pub fn unlimited() -> Self {
        Self::new(None)
    }

    // ── Read access ───────────────────────────────────────────────────────

    pub fn capacity(&self) -> Option<f64> {
        self.capacity
    }

    /// Sum of the amounts currently held.
    pub fn occupancy(&self) -> f64 {
        self.occupancy
    }

    /// Number of admitted, not yet released requests.
    pub fn holders(&self) -> usize {
        self.holders
    }

    /// Number of requests waiting for admission.
    pub fn queue_len(&self) -> usize {
        self.waiters.len()
    }

    /// Processes waiting for admission, head first.
    pub fn waiting(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.waiters.iter().map(|&(pid, _)| pid)
    }

    /// Highest occupancy ever observed.
    pub fn peak_occupancy(&self) -> f64 {
        self.peak
    }

    /// Total number of admitted requests.
    pub fn admissions(&self) -> u64 {
        self.admissions
    }

    // ── Mutation (scheduler only) ─────────────────────────────────────────

    fn fits(&self, amount: f64) -> bool {
        match self.capacity {
            None => true,
            Some(cap) => self.holders == 0 || self.occupancy + amount <= cap + OCCUPANCY_EPS,
        }
    }

    fn admit(&mut self, amount: f64) {
        self.occupancy += amount;
        self.holders += 1;
        self.admissions += 1;
        if self.occupancy > self.peak {
            self.peak = self.occupancy;
        }
    }

    /// Request `amount` on behalf of `pid`.
    ///
    /// Returns `true` if admitted immediately; otherwise the request joins
    /// the back of the queue and will be returned by a later
    /// [`release`][Self::release].
    pub(crate) fn request(&mut self, pid: ProcessId, amount: f64) -> bool {
        if self.waiters.is_empty() && self.fits(amount) {
            self.admit(amount);
            true
        } else {
            self.waiters.push_back((pid, amount));
            false
        }
    }

    /// Give back `amount` and return the processes admitted as a result, in
    /// admission order.
    ///
    /// # Panics
    ///
    /// Panics if the guard has no holders or if `amount` exceeds the current
    /// occupancy.  Either means a process released something it never held.
    pub(crate) fn release(&mut self, amount: f64) -> Vec<ProcessId> {
        assert!(self.holders > 0, "release on a guard with no holders");
        assert!(
            amount <= self.occupancy + OCCUPANCY_EPS,
            "release of {amount} exceeds occupancy {}",
            self.occupancy,
        );
        self.holders -= 1;
        self.occupancy -= amount;
        if self.holders == 0 || self.occupancy < OCCUPANCY_EPS {
            self.occupancy = 0.0;
        }

        let mut admitted = Vec::new();
        while let Some(&(pid, amt)) = self.waiters.front() {
            if !self.fits(amt) {
                break;
            }
            self.waiters.pop_front();
            self.admit(amt);
            admitted.push(pid);
        }
        admitted
    }
}
