//! # Execution guard: one orchestrated run at a time.
//!
//! [`ExecutionGuard`] serializes calls to `Orchestrator::run` / `Orchestrator::run_worker`
//! on the same orchestrator. Waiters are admitted in FIFO order.
//!
//! The permit is a RAII value: it is released on every exit path of a run
//! (success, phase failure, setup error, or the run future being dropped).

use tokio::sync::{Mutex, MutexGuard};

/// Binary gate guarding "a run is active".
#[derive(Debug, Default)]
pub(crate) struct ExecutionGuard {
    gate: Mutex<()>,
}

/// Proof that the holder owns the execution guard. Released on drop.
#[must_use = "the guard is released as soon as the permit is dropped"]
pub(crate) struct RunPermit<'a> {
    _held: MutexGuard<'a, ()>,
}

impl ExecutionGuard {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Waits until no other run is active, then claims the guard.
    pub(crate) async fn acquire(&self) -> RunPermit<'_> {
        RunPermit {
            _held: self.gate.lock().await,
        }
    }

    /// Returns `true` if a run currently holds the guard.
    pub(crate) fn is_held(&self) -> bool {
        self.gate.try_lock().is_err()
    }
}
