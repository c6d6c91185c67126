//! # Process abstractions.
//!
//! This module provides the process-related types:
//! - [`Process`] - trait for the mandatory run phase plus capability queries
//! - [`Initializable`], [`Cleanable`], [`RunTimeout`], [`SignalAware`] - optional capabilities
//! - [`Worker`] - a process with a mandatory run timeout, for looped execution
//! - [`ProcessFn`] - closure-based process implementation
//! - [`Phase`] - lifecycle phase labels

mod capabilities;
mod phase;
#[allow(clippy::module_inception)]
mod process;
mod process_fn;

pub(crate) use capabilities::Capabilities;
pub use phase::Phase;
pub use process::{
    Cleanable, Initializable, Process, ProcessRef, RunTimeout, SignalAware, Worker,
};
pub use process_fn::{ProcessFn, RunBounded, Unbounded};
