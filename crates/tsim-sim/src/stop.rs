//! Cooperative stop requests from outside the run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cloneable flag that asks a running simulation to wind down.
///
/// Vehicles check it only when they are about to start a trip, so a vehicle
/// already on an edge or at a stop always finishes its current trip first.
/// The handle is `Send + Sync`; a host can flip it from a UI or signal
/// thread while the simulation runs on another.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
