use thiserror::Error;
use tsim_core::{GuardId, LatchId, ProcessId};

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("process {0} is not registered or has already finished")]
    UnknownProcess(ProcessId),

    #[error("latch {0} does not exist")]
    UnknownLatch(LatchId),

    #[error("guard {0} does not exist")]
    UnknownGuard(GuardId),

    #[error("latch {0} was fired twice")]
    LatchAlreadyFired(LatchId),

    #[error("process {pid} requested an invalid delay {delay}")]
    InvalidDelay { pid: ProcessId, delay: f64 },

    #[error("invalid amount {amount} for guard {guard}")]
    InvalidAmount { guard: GuardId, amount: f64 },
}

pub type KernelResult<T> = Result<T, KernelError>;
