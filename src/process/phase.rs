//! Lifecycle phases of a managed process.

use std::fmt;

/// One step of the `init → run → cleanup` sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Optional one-time preparation, bounded by the init timeout.
    Init,
    /// The process body; once in single-run mode, repeatedly in worker mode.
    Run,
    /// Optional teardown after a successful or voluntarily canceled run.
    Cleanup,
}

impl Phase {
    /// Returns a short stable label for logs/metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Run => "run",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
