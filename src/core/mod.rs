//! Orchestrator core: lifecycle controllers and their building blocks.
//!
//! The public API from this module is [`Orchestrator`] (with [`OrchestratorBuilder`]),
//! its [`Config`] and the [`Signal`] type.
//!
//! Internal modules:
//! - [`orchestrator`]: entry points, guard/listener wiring, terminal events;
//! - [`single`]: single-run controller (`init → run → cleanup`);
//! - [`worker`]: worker-loop controller (`init → run × N → cleanup`);
//! - [`runner`]: executes one phase under a deadline and applies the cleanup policy;
//! - [`deadline`]: phase-scoped cancellation tokens with timeouts;
//! - [`signals`]: OS signal listener bound to one run;
//! - [`guard`]: one run at a time per orchestrator.

mod builder;
mod config;
mod deadline;
mod guard;
mod orchestrator;
mod runner;
mod signals;
mod single;
mod worker;

pub use builder::OrchestratorBuilder;
pub use config::Config;
pub use orchestrator::Orchestrator;
pub use signals::Signal;
