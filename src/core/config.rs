//! # Orchestrator configuration.
//!
//! Provides [`Config`] centralized settings for the orchestrator:
//! - which signals are intercepted during a run,
//! - the event bus capacity.
//!
//! Config is read when the orchestrator is built. The signal set can be replaced
//! later with [`Orchestrator::set_signals`](crate::Orchestrator::set_signals), which
//! needs exclusive access and therefore cannot race with an active run.
//!
//! ## Sentinel values
//! - `signals = []` → signals are not intercepted (runs end only by themselves or by timeouts)
//! - `bus_capacity = 0` → clamped to 1

use super::signals::Signal;

/// Global configuration for the orchestrator.
///
/// ## Field semantics
/// - `signals`: signals that cancel the run's root token (default `SIGINT`, `SIGTERM`)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by Bus)
#[derive(Clone, Debug)]
pub struct Config {
    /// Signals intercepted by the listener of each run.
    ///
    /// The first delivery cancels the run; a second delivery during the same run
    /// terminates the process.
    pub signals: Vec<Signal>,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Replaces the intercepted signals.
    pub fn with_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals = signals.into_iter().collect();
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `signals = [Interrupt, Terminate]`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            signals: vec![Signal::Interrupt, Signal::Terminate],
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_intercept_interrupt_and_terminate() {
        let cfg = Config::default();
        assert_eq!(cfg.signals, vec![Signal::Interrupt, Signal::Terminate]);
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn with_signals_replaces_the_set() {
        let cfg = Config::default().with_signals([Signal::Hangup]);
        assert_eq!(cfg.signals, vec![Signal::Hangup]);
    }
}
