//! # Single-run controller.
//!
//! ```text
//! init (child of root, init timeout)        ── Err ──► RunError::Init
//!   ▼
//! run  (child of root, run timeout | unbounded)
//!   ├─ Fail                 ──► CleanupSkipped, RunError::Run
//!   └─ Ok/Canceled/Timeout  ──► cleanup (fresh token, cleanup timeout)
//!                                  ├─ Fail ──► RunError::Cleanup
//!                                  └─ else ──► Ok
//! ```
//!
//! Without a run timeout the run is bounded only by signals.

use crate::{
    core::{deadline::Deadline, runner::RunContext},
    error::RunError,
    process::{Phase, Process},
};

/// Drives `init → run → cleanup` once.
pub(crate) async fn run_once<P: Process + ?Sized>(ctx: &RunContext<'_, P>) -> Result<(), RunError> {
    ctx.init().await?;

    let deadline = match ctx.caps.run_timeout {
        Some(timeout) => Deadline::child(ctx.root, timeout),
        None => Deadline::unbounded(ctx.root),
    };
    let outcome = ctx
        .phase(Phase::Run, None, &deadline, ctx.process.run(deadline.token()))
        .await;
    drop(deadline);

    ctx.settle(outcome).await
}
