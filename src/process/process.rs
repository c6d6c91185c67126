//! # Process abstraction and optional capabilities.
//!
//! A [`Process`] is the unit of work handed to the [`Orchestrator`](crate::Orchestrator).
//! Only [`Process::run`] is mandatory. Every other behavior is an optional capability,
//! implemented as a separate trait and advertised through an `as_*` query on [`Process`]:
//!
//! | Capability        | Trait               | Query                         |
//! |-------------------|---------------------|-------------------------------|
//! | init + timeout    | [`Initializable`]   | [`Process::as_initializable`] |
//! | cleanup + timeout | [`Cleanable`]       | [`Process::as_cleanable`]     |
//! | run timeout       | [`RunTimeout`]      | [`Process::as_run_timeout`]   |
//! | signal callback   | [`SignalAware`]     | [`Process::as_signal_aware`]  |
//!
//! Operations and their timeouts live on the same trait, so a phase can never be
//! advertised without its deadline (or the reverse).
//!
//! [`Worker`] is `Process + RunTimeout`: worker mode needs a per-iteration timeout,
//! and requiring it in the type keeps that a compile-time contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::Signal;
use crate::error::ProcessError;

/// # Shared handle to a process object.
pub type ProcessRef = Arc<dyn Process>;

/// # Asynchronous, cancelable unit of work.
///
/// Implementors should watch the token they receive and return promptly once it is
/// cancelled. Returning [`ProcessError::Canceled`] means "finished on purpose" and
/// is not treated as a failure.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use procvisor::{Cleanable, Process, ProcessError};
///
/// struct Server;
///
/// #[async_trait]
/// impl Process for Server {
///     fn name(&self) -> &str { "server" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
///         ctx.cancelled().await;
///         Err(ProcessError::Canceled)
///     }
///
///     fn as_cleanable(&self) -> Option<&dyn Cleanable> { Some(self) }
/// }
///
/// #[async_trait]
/// impl Cleanable for Server {
///     async fn cleanup(&self, _ctx: CancellationToken) -> Result<(), ProcessError> {
///         Ok(())
///     }
///
///     fn cleanup_timeout(&self) -> Duration { Duration::from_secs(5) }
/// }
/// ```
#[async_trait]
pub trait Process: Send + Sync + 'static {
    /// Returns a stable, human-readable name (used in events).
    fn name(&self) -> &str {
        "process"
    }

    /// Executes the process body.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError>;

    /// Returns the init capability, if implemented.
    fn as_initializable(&self) -> Option<&dyn Initializable> {
        None
    }

    /// Returns the cleanup capability, if implemented.
    fn as_cleanable(&self) -> Option<&dyn Cleanable> {
        None
    }

    /// Returns the run-timeout capability, if implemented.
    ///
    /// Single-run mode without it bounds the run by signals only.
    fn as_run_timeout(&self) -> Option<&dyn RunTimeout> {
        None
    }

    /// Returns the signal callback capability, if implemented.
    fn as_signal_aware(&self) -> Option<&dyn SignalAware> {
        None
    }
}

/// Optional init phase. Runs once, before the first run, under [`init_timeout`](Self::init_timeout).
///
/// Any error (including `Canceled`) aborts the whole run.
#[async_trait]
pub trait Initializable: Send + Sync {
    async fn init(&self, ctx: CancellationToken) -> Result<(), ProcessError>;

    fn init_timeout(&self) -> Duration;
}

/// Optional cleanup phase. Runs once after a successful or soft run under
/// [`cleanup_timeout`](Self::cleanup_timeout), with a token that is **not** tied to signals.
#[async_trait]
pub trait Cleanable: Send + Sync {
    async fn cleanup(&self, ctx: CancellationToken) -> Result<(), ProcessError>;

    fn cleanup_timeout(&self) -> Duration;
}

/// Run-phase timeout (per iteration in worker mode).
///
/// Advertise it through [`Process::as_run_timeout`] as well: single runs only see
/// the timeout through that query, and worker runs require both to agree.
pub trait RunTimeout: Send + Sync {
    fn run_timeout(&self) -> Duration;
}

/// Callback invoked from the signal listener when a configured signal is caught.
///
/// Called at most once per run, after the run's root token has been cancelled.
/// Keep it short: it runs on the listener task.
pub trait SignalAware: Send + Sync {
    fn on_signal(&self, signal: Signal);
}

/// A process that can be driven in a loop by [`Orchestrator::run_worker`](crate::Orchestrator::run_worker).
///
/// The run timeout is mandatory here: a process without a [`RunTimeout`] does not compile
/// as a worker.
pub trait Worker: Process + RunTimeout {}

impl<T: Process + RunTimeout + ?Sized> Worker for T {}
