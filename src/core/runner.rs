//! # Phase execution shared by both controllers.
//!
//! Executes one phase of a [`Process`] under a [`Deadline`] and publishes lifecycle
//! events to [`Bus`]. Also hosts the init prologue and the cleanup policy that the
//! single-run and worker controllers have in common.
//!
//! ## Event flow
//!
//! ```text
//! Success / soft outcome:
//!   PhaseStarting → phase future → Ok | Canceled | Timeout → PhaseStopped
//!
//! Failure:
//!   PhaseStarting → phase future → Fail → PhaseFailed
//!
//! Deadline fired:
//!   ... → TimeoutHit → PhaseStopped (soft) or PhaseFailed (hard)
//! ```
//!
//! ## Rules
//! - The phase future is always awaited to completion; expiry only cancels its token.
//! - `Canceled` returned after the phase's own deadline fired is reported as `Timeout`.
//! - Init has no soft outcomes: any error aborts the run.
//! - A hard run outcome skips cleanup; soft outcomes and success run it.
//! - Cleanup gets a fresh token, independent of signals, bounded by its own timeout.
//! - Only a hard cleanup outcome is an error.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{
    core::deadline::Deadline,
    error::{ProcessError, RunError},
    events::{Bus, Event, EventKind},
    process::{Capabilities, Phase, Process, Worker},
};

/// Everything a controller needs for one run of one process.
pub(crate) struct RunContext<'a, P: ?Sized> {
    pub process: &'a P,
    pub caps: Capabilities<'a>,
    /// Cancelled only by the signal listener.
    pub root: &'a CancellationToken,
    pub bus: &'a Bus,
}

impl<'a, P: Process + ?Sized> RunContext<'a, P> {
    pub(crate) fn new(process: &'a P, root: &'a CancellationToken, bus: &'a Bus) -> Self {
        Self {
            process,
            caps: Capabilities::of(process),
            root,
            bus,
        }
    }

    /// Same as [`RunContext::new`], with the run timeout resolved for looped execution.
    pub(crate) fn worker(process: &'a P, root: &'a CancellationToken, bus: &'a Bus) -> Self
    where
        P: Worker,
    {
        Self {
            process,
            caps: Capabilities::of_worker(process),
            root,
            bus,
        }
    }

    /// Creates an event pre-filled with the process name.
    pub(crate) fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_process(self.process.name())
    }

    /// Runs one phase future under `deadline`, publishing its lifecycle events.
    pub(crate) async fn phase<F>(
        &self,
        phase: Phase,
        iteration: Option<u64>,
        deadline: &Deadline,
        fut: F,
    ) -> Result<(), ProcessError>
    where
        F: Future<Output = Result<(), ProcessError>>,
    {
        let mut starting = self
            .event(EventKind::PhaseStarting)
            .with_phase(phase)
            .with_iteration_opt(iteration);
        if let Some(timeout) = deadline.timeout() {
            starting = starting.with_timeout(timeout);
        }
        self.bus.publish(starting);

        let res = fut.await;

        let expired = deadline.is_expired();
        let res = match (res, deadline.timeout()) {
            (Err(ProcessError::Canceled), Some(timeout)) if expired => {
                Err(ProcessError::Timeout { timeout })
            }
            (res, _) => res,
        };

        if expired {
            let mut hit = self
                .event(EventKind::TimeoutHit)
                .with_phase(phase)
                .with_iteration_opt(iteration);
            if let Some(timeout) = deadline.timeout() {
                hit = hit.with_timeout(timeout);
            }
            self.bus.publish(hit);
        }

        let done = match &res {
            Ok(()) => self.event(EventKind::PhaseStopped),
            Err(e) if e.is_soft() => self.event(EventKind::PhaseStopped).with_reason(e.to_string()),
            Err(e) => self.event(EventKind::PhaseFailed).with_reason(e.to_string()),
        };
        self.bus
            .publish(done.with_phase(phase).with_iteration_opt(iteration));
        res
    }

    /// Runs init, if the process has it, under a child of the root token.
    pub(crate) async fn init(&self) -> Result<(), RunError> {
        let Some(init) = self.caps.init else {
            return Ok(());
        };
        let deadline = Deadline::child(self.root, init.init_timeout());
        self.phase(Phase::Init, None, &deadline, init.init(deadline.token()))
            .await
            .map_err(|source| RunError::in_phase(Phase::Init, source))
    }

    /// Applies the cleanup policy to the final run outcome.
    ///
    /// Hard failure: cleanup is skipped and the failure is returned.
    /// Otherwise: cleanup runs (if present) and decides the result.
    pub(crate) async fn settle(&self, outcome: Result<(), ProcessError>) -> Result<(), RunError> {
        match outcome {
            Err(source) if !source.is_soft() => {
                if self.caps.cleanup.is_some() {
                    self.bus.publish(
                        self.event(EventKind::CleanupSkipped)
                            .with_phase(Phase::Cleanup)
                            .with_reason(source.to_string()),
                    );
                }
                Err(RunError::in_phase(Phase::Run, source))
            }
            _ => self.cleanup().await,
        }
    }

    async fn cleanup(&self) -> Result<(), RunError> {
        let Some(cleanup) = self.caps.cleanup else {
            return Ok(());
        };
        let deadline = Deadline::fresh(cleanup.cleanup_timeout());
        match self
            .phase(Phase::Cleanup, None, &deadline, cleanup.cleanup(deadline.token()))
            .await
        {
            Err(source) if !source.is_soft() => Err(RunError::in_phase(Phase::Cleanup, source)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::process::ProcessFn;

    type Ready = futures::future::Ready<Result<(), ProcessError>>;

    fn idle() -> ProcessFn<impl Fn(CancellationToken) -> Ready + Send + Sync + 'static> {
        ProcessFn::new("idle", |_ctx: CancellationToken| futures::future::ready(Ok(())))
    }

    fn kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_after_own_deadline_is_reported_as_timeout() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let root = CancellationToken::new();
        let p = idle();
        let ctx = RunContext::new(&p, &root, &bus);

        let deadline = Deadline::fresh(Duration::from_secs(1));
        let token = deadline.token();
        let res = ctx
            .phase(Phase::Run, Some(1), &deadline, async move {
                token.cancelled().await;
                Err(ProcessError::Canceled)
            })
            .await;

        assert_eq!(
            res,
            Err(ProcessError::Timeout {
                timeout: Duration::from_secs(1)
            })
        );
        assert_eq!(
            kinds(&mut rx),
            vec![
                EventKind::PhaseStarting,
                EventKind::TimeoutHit,
                EventKind::PhaseStopped
            ]
        );
    }

    #[tokio::test]
    async fn canceled_by_parent_stays_canceled() {
        let bus = Bus::new(16);
        let root = CancellationToken::new();
        let p = idle();
        let ctx = RunContext::new(&p, &root, &bus);

        let deadline = Deadline::child(&root, Duration::from_secs(60));
        root.cancel();
        let token = deadline.token();
        let res = ctx
            .phase(Phase::Run, None, &deadline, async move {
                token.cancelled().await;
                Err(ProcessError::Canceled)
            })
            .await;
        assert_eq!(res, Err(ProcessError::Canceled));
    }

    #[tokio::test]
    async fn hard_outcome_skips_cleanup_and_reports_run_phase() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let root = CancellationToken::new();
        let p = idle().with_cleanup(Duration::from_secs(1), |_ctx| async {
            Err(ProcessError::fail("cleanup must not run after a hard failure"))
        });
        let ctx = RunContext::new(&p, &root, &bus);

        let err = ctx
            .settle(Err(ProcessError::fail("broken pipe")))
            .await
            .unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Run));
        assert_eq!(kinds(&mut rx), vec![EventKind::CleanupSkipped]);
    }

    #[tokio::test]
    async fn soft_cleanup_outcome_is_not_an_error() {
        let bus = Bus::new(16);
        let root = CancellationToken::new();
        let p = idle().with_cleanup(Duration::from_secs(1), |_ctx| async {
            Err(ProcessError::Canceled)
        });
        let ctx = RunContext::new(&p, &root, &bus);

        assert!(ctx.settle(Err(ProcessError::Canceled)).await.is_ok());
    }

    #[tokio::test]
    async fn soft_init_outcome_is_an_error() {
        let bus = Bus::new(16);
        let root = CancellationToken::new();
        let p = idle().with_init(Duration::from_secs(1), |_ctx| async {
            Err(ProcessError::Canceled)
        });
        let ctx = RunContext::new(&p, &root, &bus);

        let err = ctx.init().await.unwrap_err();
        assert_eq!(err.phase(), Some(Phase::Init));
        assert_eq!(err.process_error(), Some(&ProcessError::Canceled));
    }
}
