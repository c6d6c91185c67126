//! Capabilities of a process, resolved once per run.

use std::time::Duration;

use super::process::{Cleanable, Initializable, Process, Worker};

/// Snapshot of which optional phases a process provides.
///
/// Capabilities are static for a process instance, so the orchestrator queries
/// them once at run start instead of before every phase.
pub(crate) struct Capabilities<'a> {
    pub init: Option<&'a dyn Initializable>,
    pub cleanup: Option<&'a dyn Cleanable>,
    pub run_timeout: Option<Duration>,
}

impl<'a> Capabilities<'a> {
    /// Resolves the capabilities a single run uses; the run timeout is optional.
    pub fn of<P: Process + ?Sized>(process: &'a P) -> Self {
        Self {
            init: process.as_initializable(),
            cleanup: process.as_cleanable(),
            run_timeout: process.as_run_timeout().map(|t| t.run_timeout()),
        }
    }

    /// Resolves the capabilities of a worker; the run timeout is always present.
    ///
    /// Takes the timeout from the [`RunTimeout`](super::RunTimeout) implementation the
    /// `Worker` bound guarantees. A worker that does not advertise the same timeout
    /// through `as_run_timeout` would run unbounded in single mode; debug builds
    /// reject it.
    pub fn of_worker<W: Worker + ?Sized>(worker: &'a W) -> Self {
        let run_timeout = worker.run_timeout();
        debug_assert!(
            matches!(worker.as_run_timeout(), Some(t) if t.run_timeout() == run_timeout),
            "{}: `as_run_timeout` must return the `RunTimeout` implementation",
            worker.name()
        );
        Self {
            run_timeout: Some(run_timeout),
            ..Self::of(worker)
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::ProcessError;
    use crate::process::RunTimeout;

    /// Implements `RunTimeout` without advertising it.
    struct Silent;

    #[async_trait]
    impl Process for Silent {
        async fn run(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
            Ok(())
        }
    }

    impl RunTimeout for Silent {
        fn run_timeout(&self) -> Duration {
            Duration::from_millis(50)
        }
    }

    #[test]
    fn single_run_sees_only_the_advertised_timeout() {
        assert_eq!(Capabilities::of(&Silent).run_timeout, None);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "as_run_timeout")]
    fn worker_must_advertise_its_run_timeout() {
        let _ = Capabilities::of_worker(&Silent);
    }
}
