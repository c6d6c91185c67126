//! Error types used by the procvisor orchestrator and the processes it drives.
//!
//! This module defines two main error enums:
//!
//! - [`ProcessError`]: outcomes reported by a process phase (`init`, `run`, `cleanup`).
//! - [`RunError`]: the final error returned by [`Orchestrator::run`](crate::Orchestrator::run)
//!   and [`Orchestrator::run_worker`](crate::Orchestrator::run_worker), tagged with the phase that failed.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics,
//! and [`ProcessError::is_soft`] classifies outcomes for the cleanup policy.

use std::fmt::Display;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::process::Phase;

/// # Errors reported by a process phase.
///
/// `Canceled` and `Timeout` are **soft**: after a run they route to cleanup and the
/// orchestrator reports success. `Fail` is **hard** and aborts the run.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The process finished on purpose (usually after observing its token).
    ///
    /// This is the voluntary-cancellation sentinel, not a failure.
    #[error("context cancelled")]
    Canceled,

    /// The phase deadline expired before the process completed.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// The phase failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },
}

impl ProcessError {
    /// Builds a [`ProcessError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use procvisor::ProcessError;
    ///
    /// let err = ProcessError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        ProcessError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns `true` for outcomes that are not failures (`Canceled`, `Timeout`).
    ///
    /// # Example
    /// ```
    /// use procvisor::ProcessError;
    /// use std::time::Duration;
    ///
    /// assert!(ProcessError::Canceled.is_soft());
    /// assert!(ProcessError::Timeout { timeout: Duration::from_secs(1) }.is_soft());
    /// assert!(!ProcessError::fail("boom").is_soft());
    /// ```
    pub fn is_soft(&self) -> bool {
        matches!(self, ProcessError::Canceled | ProcessError::Timeout { .. })
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcessError::Canceled => "process_canceled",
            ProcessError::Timeout { .. } => "process_timeout",
            ProcessError::Fail { .. } => "process_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ProcessError::Canceled => "context cancelled".to_string(),
            ProcessError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            ProcessError::Fail { error } => format!("error: {error}"),
        }
    }
}

/// # Errors returned to the caller of a run.
///
/// Every phase failure keeps the phase that produced it, so an init failure
/// (nothing else ran) is distinguishable from a cleanup failure (the work itself succeeded).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RunError {
    /// Init did not complete successfully; run and cleanup were skipped.
    #[error("failed init: {source}")]
    Init {
        /// What the init phase reported.
        #[source]
        source: ProcessError,
    },

    /// Run (or the deciding worker iteration) failed; cleanup was skipped.
    #[error("failed run: {source}")]
    Run {
        /// What the run phase reported.
        #[source]
        source: ProcessError,
    },

    /// Cleanup failed after an otherwise successful run.
    #[error("failed cleanup: {source}")]
    Cleanup {
        /// What the cleanup phase reported.
        #[source]
        source: ProcessError,
    },

    /// The signal listener could not be installed; no phase was started.
    #[error("failed to install signal listener: {source}")]
    SignalSetup {
        /// Registration error from the OS.
        #[source]
        source: io::Error,
    },
}

impl RunError {
    /// Returns the phase that failed, if the error came from a phase.
    ///
    /// # Example
    /// ```
    /// use procvisor::{Phase, ProcessError, RunError};
    ///
    /// let err = RunError::Cleanup { source: ProcessError::fail("disk full") };
    /// assert_eq!(err.phase(), Some(Phase::Cleanup));
    /// ```
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunError::Init { .. } => Some(Phase::Init),
            RunError::Run { .. } => Some(Phase::Run),
            RunError::Cleanup { .. } => Some(Phase::Cleanup),
            RunError::SignalSetup { .. } => None,
        }
    }

    /// Returns the underlying phase outcome, if any.
    pub fn process_error(&self) -> Option<&ProcessError> {
        match self {
            RunError::Init { source } | RunError::Run { source } | RunError::Cleanup { source } => {
                Some(source)
            }
            RunError::SignalSetup { .. } => None,
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RunError::Init { .. } => "run_init_failed",
            RunError::Run { .. } => "run_failed",
            RunError::Cleanup { .. } => "run_cleanup_failed",
            RunError::SignalSetup { .. } => "run_signal_setup_failed",
        }
    }

    /// Wraps a phase outcome into the error for that phase.
    pub(crate) fn in_phase(phase: Phase, source: ProcessError) -> Self {
        match phase {
            Phase::Init => RunError::Init { source },
            Phase::Run => RunError::Run { source },
            Phase::Cleanup => RunError::Cleanup { source },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn soft_outcomes_are_canceled_and_timeout_only() {
        assert!(ProcessError::Canceled.is_soft());
        assert!(
            ProcessError::Timeout {
                timeout: Duration::from_millis(5)
            }
            .is_soft()
        );
        assert!(!ProcessError::fail("x").is_soft());
    }

    #[test]
    fn run_error_keeps_phase_and_cause() {
        let err = RunError::in_phase(Phase::Init, ProcessError::fail("no config"));
        assert_eq!(err.phase(), Some(Phase::Init));
        assert_eq!(err.as_label(), "run_init_failed");
        assert_eq!(err.to_string(), "failed init: execution failed: no config");

        let cause = err.source().map(|s| s.to_string());
        assert_eq!(cause.as_deref(), Some("execution failed: no config"));
    }

    #[test]
    fn signal_setup_has_no_phase() {
        let err = RunError::SignalSetup {
            source: io::Error::other("denied"),
        };
        assert_eq!(err.phase(), None);
        assert!(err.process_error().is_none());
    }
}
