//! # Runtime events emitted by the orchestrator.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Run events**: one orchestrated run (starting, finished, failed, signal caught)
//! - **Phase events**: init / run / cleanup flow (starting, stopped, failed, timeout, skipped)
//! - **Subscriber events**: delivery problems of the fan-out (overflow, panic)
//!
//! The [`Event`] struct carries additional metadata such as timestamps, process name,
//! phase, worker iteration and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{Event, EventKind, Phase};
//!
//! let ev = Event::new(EventKind::PhaseFailed)
//!     .with_process("indexer")
//!     .with_phase(Phase::Run)
//!     .with_iteration(3)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::PhaseFailed);
//! assert_eq!(ev.process.as_deref(), Some("indexer"));
//! assert_eq!(ev.iteration, Some(3));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::Signal;
use crate::process::Phase;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Run events ===
    /// The execution guard was acquired and a run begins.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `mode`: single or worker
    RunStarting,

    /// The run completed without error.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `mode`: single or worker
    /// - `iteration`: iterations executed (worker mode)
    RunFinished,

    /// The run returned an error.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `mode`: single or worker
    /// - `phase`: failed phase (absent for setup errors)
    /// - `reason`: error message
    RunFailed,

    /// A configured signal was caught; the run's root token is cancelled.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `signal`: caught signal
    SignalCaught,

    // === Phase events ===
    /// A phase (or worker iteration) is starting.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `phase`: phase
    /// - `iteration`: worker iteration (1-based, worker run phase only)
    /// - `timeout_ms`: phase timeout, if bounded
    PhaseStarting,

    /// A phase ended with success or a soft outcome (cancelled / timed out).
    ///
    /// Sets:
    /// - `process`, `phase`, `iteration`
    /// - `reason`: soft outcome message, if not plain success
    PhaseStopped,

    /// A phase ended with an error.
    ///
    /// Sets:
    /// - `process`, `phase`, `iteration`
    /// - `reason`: failure message
    PhaseFailed,

    /// The phase deadline fired before the phase returned.
    ///
    /// Sets:
    /// - `process`, `phase`, `iteration`
    /// - `timeout_ms`: configured timeout
    TimeoutHit,

    /// Cleanup was skipped because the run failed.
    ///
    /// Sets:
    /// - `process`: process name
    /// - `phase`: always `Cleanup`
    /// - `reason`: the run failure
    CleanupSkipped,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `process`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `process`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,
}

/// Which controller drives the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// `init → run → cleanup`, once.
    Single,
    /// `init → run × N → cleanup`.
    Worker,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Single => "single",
            RunMode::Worker => "worker",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the process (or subscriber), if applicable.
    pub process: Option<Arc<str>>,
    /// Controller mode.
    pub mode: Option<RunMode>,
    /// Lifecycle phase.
    pub phase: Option<Phase>,
    /// Worker iteration (starting from 1).
    pub iteration: Option<u64>,
    /// Phase timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Caught signal.
    pub signal: Option<Signal>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            process: None,
            mode: None,
            phase: None,
            iteration: None,
            timeout_ms: None,
            signal: None,
            reason: None,
        }
    }

    /// Attaches a process name.
    #[inline]
    pub fn with_process(mut self, name: impl Into<Arc<str>>) -> Self {
        self.process = Some(name.into());
        self
    }

    /// Attaches the controller mode.
    #[inline]
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Attaches a phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches a worker iteration number.
    #[inline]
    pub fn with_iteration(mut self, n: u64) -> Self {
        self.iteration = Some(n);
        self
    }

    /// Attaches a worker iteration number when present.
    #[inline]
    pub(crate) fn with_iteration_opt(mut self, n: Option<u64>) -> Self {
        self.iteration = n;
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a caught signal.
    #[inline]
    pub fn with_signal(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event for the `dropped` event.
    ///
    /// Keeps the phase and iteration of the dropped event, so a lost phase event
    /// can still be placed in the run.
    pub(crate) fn subscriber_overflow(
        subscriber: &'static str,
        reason: &'static str,
        dropped: &Event,
    ) -> Self {
        let of = dropped.process.as_deref().unwrap_or("-");
        let mut ev = Event::new(EventKind::SubscriberOverflow)
            .with_process(subscriber)
            .with_reason(format!(
                "subscriber={subscriber} reason={reason} dropped={:?} of={of}",
                dropped.kind
            ));
        ev.phase = dropped.phase;
        ev.iteration = dropped.iteration;
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub(crate) fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_process(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::RunStarting);
        let b = Event::new(EventKind::RunFinished);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn timeout_is_stored_in_saturating_millis() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_millis(1500));
        assert_eq!(ev.timeout_ms, Some(1500));

        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::MAX);
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }
}
