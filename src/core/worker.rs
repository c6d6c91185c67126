//! # Worker-loop controller.
//!
//! Runs init once, then the process body repeatedly, then cleanup.
//!
//! ```text
//! init (child of root, init timeout)
//!
//! loop {
//!   ├─► iteration += 1
//!   ├─► Deadline::fresh(run_timeout)           (NOT derived from root)
//!   ├─► run(token)
//!   │     ├─ Fail              ─► break (hard)
//!   │     ├─ Canceled/Timeout  ─► break (soft)
//!   │     └─ Ok
//!   │          ├─ root cancelled ─► break (signal observed between iterations)
//!   │          └─ otherwise       ─► yield, continue
//! }
//!
//! settle(last outcome): hard ─► RunError::Run, cleanup skipped
//!                       soft ─► cleanup (fresh token)
//! ```
//!
//! ## Rules
//! - Every iteration gets the **full** run timeout; budgets are never shared.
//! - A signal never interrupts an iteration: the iteration token is independent of
//!   the root, and the root is only checked after the iteration returns.
//! - Returning [`ProcessError::Canceled`](crate::ProcessError::Canceled) is how a
//!   worker says "done"; it leads to cleanup and overall success.

use tokio_util::sync::CancellationToken;

use crate::{
    core::{deadline::Deadline, runner::RunContext},
    error::RunError,
    process::{Phase, Worker},
};

/// Result of a worker run together with the number of executed iterations.
pub(crate) struct WorkerOutcome {
    pub iterations: u64,
    pub result: Result<(), RunError>,
}

/// Drives `init → run × N → cleanup`.
pub(crate) async fn run_loop<W: Worker + ?Sized>(ctx: &RunContext<'_, W>) -> WorkerOutcome {
    if let Err(e) = ctx.init().await {
        return WorkerOutcome {
            iterations: 0,
            result: Err(e),
        };
    }

    let mut iterations: u64 = 0;

    let outcome = loop {
        iterations += 1;

        // `RunContext::worker` always resolves a timeout.
        let deadline = match ctx.caps.run_timeout {
            Some(timeout) => Deadline::fresh(timeout),
            None => Deadline::unbounded(&CancellationToken::new()),
        };
        let res = ctx
            .phase(
                Phase::Run,
                Some(iterations),
                &deadline,
                ctx.process.run(deadline.token()),
            )
            .await;
        drop(deadline);

        if res.is_err() || ctx.root.is_cancelled() {
            break res;
        }
        // Lets the signal listener run on single-threaded runtimes.
        tokio::task::yield_now().await;
    };

    WorkerOutcome {
        iterations,
        result: ctx.settle(outcome).await,
    }
}
