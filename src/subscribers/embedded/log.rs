//! # LogWriter: structured event logger
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records
//! under the `procvisor` target. Install any `tracing` subscriber to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO procvisor: run starting process="indexer" mode="worker"
//! INFO procvisor: phase starting process="indexer" phase="run" iteration=3 timeout_ms=5000
//! WARN procvisor: phase timeout process="indexer" phase="run" iteration=3 timeout_ms=5000
//! INFO procvisor: phase stopped process="indexer" phase="run" iteration=3 reason="timed out after 5s"
//! WARN procvisor: signal caught process="indexer" signal="SIGTERM"
//! ERROR procvisor: run failed process="indexer" phase="cleanup" reason="..."
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let process = e.process.as_deref().unwrap_or("unknown");
        let phase = e.phase.map(|p| p.as_str());
        let reason = e.reason.as_deref();

        match e.kind {
            EventKind::RunStarting => {
                info!(target: "procvisor", process, mode = e.mode.map(|m| m.as_str()), "run starting");
            }
            EventKind::RunFinished => {
                info!(target: "procvisor", process, iterations = e.iteration, "run finished");
            }
            EventKind::RunFailed => {
                error!(target: "procvisor", process, phase, reason, "run failed");
            }
            EventKind::SignalCaught => {
                warn!(
                    target: "procvisor",
                    process,
                    signal = %e.signal.map(|s| s.to_string()).unwrap_or_default(),
                    "signal caught"
                );
            }
            EventKind::PhaseStarting => {
                debug!(
                    target: "procvisor",
                    process,
                    phase,
                    iteration = e.iteration,
                    timeout_ms = e.timeout_ms,
                    "phase starting"
                );
            }
            EventKind::PhaseStopped => {
                debug!(target: "procvisor", process, phase, iteration = e.iteration, reason, "phase stopped");
            }
            EventKind::PhaseFailed => {
                warn!(target: "procvisor", process, phase, iteration = e.iteration, reason, "phase failed");
            }
            EventKind::TimeoutHit => {
                warn!(
                    target: "procvisor",
                    process,
                    phase,
                    iteration = e.iteration,
                    timeout_ms = e.timeout_ms,
                    "phase timeout"
                );
            }
            EventKind::CleanupSkipped => {
                warn!(target: "procvisor", process, reason, "cleanup skipped");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: "procvisor", subscriber = process, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                error!(target: "procvisor", subscriber = process, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
