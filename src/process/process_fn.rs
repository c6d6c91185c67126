//! # Function-backed process (`ProcessFn`)
//!
//! [`ProcessFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a fresh
//! future per call. This is handy for workers driven in a loop: every iteration gets
//! its own future and no state is shared implicitly between iterations. If state must
//! survive across iterations, capture an `Arc<...>` explicitly.
//!
//! Optional phases are attached with builder methods. Each one switches on the
//! matching capability query of [`Process`]:
//! - [`ProcessFn::with_run_timeout`] → [`RunTimeout`]
//! - [`ProcessFn::with_init`] → [`Initializable`]
//! - [`ProcessFn::with_cleanup`] → [`Cleanable`]
//! - [`ProcessFn::with_on_signal`] → [`SignalAware`]
//!
//! The run timeout is tracked in the type: only `ProcessFn<F, RunBounded>` implements
//! [`RunTimeout`], so only a process built with `with_run_timeout` is a [`Worker`](crate::Worker).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{Process, ProcessError, ProcessFn, RunTimeout};
//!
//! let p = ProcessFn::new("poller", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(ProcessError::Canceled);
//!     }
//!     // poll...
//!     Ok(())
//! })
//! .with_cleanup(Duration::from_secs(1), |_ctx| async { Ok(()) })
//! .with_run_timeout(Duration::from_secs(2));
//!
//! let p = Arc::new(p);
//! assert_eq!(p.name(), "poller");
//! assert_eq!(p.run_timeout(), Duration::from_secs(2));
//! assert!(p.as_cleanable().is_some());
//! assert!(p.as_initializable().is_none());
//! ```
//!
//! Without a run timeout the process cannot be driven as a worker:
//! ```compile_fail
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{Config, Orchestrator, ProcessFn};
//!
//! async fn drive(orch: &Orchestrator) {
//!     let p = ProcessFn::arc("unbounded", |_ctx: CancellationToken| async { Ok(()) });
//!     let _ = orch.run_worker(p).await;
//! }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::core::Signal;
use crate::error::ProcessError;
use crate::process::process::{Cleanable, Initializable, Process, RunTimeout, SignalAware};

type HookFn =
    Box<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), ProcessError>> + Send + Sync>;

/// Closure plus deadline for an optional phase.
struct Hook {
    f: HookFn,
    timeout: Duration,
}

impl Hook {
    fn new<H, HFut>(timeout: Duration, f: H) -> Self
    where
        H: Fn(CancellationToken) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        Self {
            f: Box::new(move |ctx| f(ctx).boxed()),
            timeout,
        }
    }
}

/// Run-timeout state of a [`ProcessFn`]: no run timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

/// Run-timeout state of a [`ProcessFn`]: every run is bounded by the held duration.
#[derive(Debug, Clone, Copy)]
pub struct RunBounded(Duration);

impl RunTimeout for RunBounded {
    fn run_timeout(&self) -> Duration {
        self.0
    }
}

mod sealed {
    use crate::process::process::RunTimeout;

    pub trait RunBound: Send + Sync + 'static {
        fn as_run_timeout(&self) -> Option<&dyn RunTimeout>;
    }

    impl RunBound for super::Unbounded {
        fn as_run_timeout(&self) -> Option<&dyn RunTimeout> {
            None
        }
    }

    impl RunBound for super::RunBounded {
        fn as_run_timeout(&self) -> Option<&dyn RunTimeout> {
            Some(self)
        }
    }
}

/// Function-backed process implementation.
///
/// `B` is [`Unbounded`] until [`ProcessFn::with_run_timeout`] turns it into [`RunBounded`].
pub struct ProcessFn<F, B = Unbounded> {
    name: Cow<'static, str>,
    f: F,
    bound: B,
    init: Option<Hook>,
    cleanup: Option<Hook>,
    on_signal: Option<Box<dyn Fn(Signal) + Send + Sync>>,
}

impl<F> ProcessFn<F> {
    /// Creates a process with only a run phase.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            bound: Unbounded,
            init: None,
            cleanup: None,
            on_signal: None,
        }
    }

    /// Creates the process and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Bounds each run (each iteration in worker mode) by `timeout`.
    pub fn with_run_timeout(self, timeout: Duration) -> ProcessFn<F, RunBounded> {
        ProcessFn {
            name: self.name,
            f: self.f,
            bound: RunBounded(timeout),
            init: self.init,
            cleanup: self.cleanup,
            on_signal: self.on_signal,
        }
    }
}

impl<F, B> ProcessFn<F, B> {
    /// Wraps the configured process into a shared handle.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Adds an init phase bounded by `timeout`.
    pub fn with_init<H, HFut>(mut self, timeout: Duration, f: H) -> Self
    where
        H: Fn(CancellationToken) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        self.init = Some(Hook::new(timeout, f));
        self
    }

    /// Adds a cleanup phase bounded by `timeout`.
    pub fn with_cleanup<H, HFut>(mut self, timeout: Duration, f: H) -> Self
    where
        H: Fn(CancellationToken) -> HFut + Send + Sync + 'static,
        HFut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        self.cleanup = Some(Hook::new(timeout, f));
        self
    }

    /// Adds a callback for caught signals.
    pub fn with_on_signal(mut self, f: impl Fn(Signal) + Send + Sync + 'static) -> Self {
        self.on_signal = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl<F, Fut, B> Process for ProcessFn<F, B>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    B: sealed::RunBound,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        (self.f)(ctx).await
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        self.init.as_ref().map(|_| self as &dyn Initializable)
    }

    fn as_cleanable(&self) -> Option<&dyn Cleanable> {
        self.cleanup.as_ref().map(|_| self as &dyn Cleanable)
    }

    fn as_run_timeout(&self) -> Option<&dyn RunTimeout> {
        self.bound.as_run_timeout()
    }

    fn as_signal_aware(&self) -> Option<&dyn SignalAware> {
        self.on_signal.as_ref().map(|_| self as &dyn SignalAware)
    }
}

#[async_trait]
impl<F: Send + Sync, B: Send + Sync> Initializable for ProcessFn<F, B> {
    async fn init(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        match &self.init {
            Some(hook) => (hook.f)(ctx).await,
            None => Ok(()),
        }
    }

    fn init_timeout(&self) -> Duration {
        self.init.as_ref().map_or(Duration::ZERO, |h| h.timeout)
    }
}

#[async_trait]
impl<F: Send + Sync, B: Send + Sync> Cleanable for ProcessFn<F, B> {
    async fn cleanup(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        match &self.cleanup {
            Some(hook) => (hook.f)(ctx).await,
            None => Ok(()),
        }
    }

    fn cleanup_timeout(&self) -> Duration {
        self.cleanup.as_ref().map_or(Duration::ZERO, |h| h.timeout)
    }
}

impl<F: Send + Sync> RunTimeout for ProcessFn<F, RunBounded> {
    fn run_timeout(&self) -> Duration {
        self.bound.0
    }
}

impl<F: Send + Sync, B: Send + Sync> SignalAware for ProcessFn<F, B> {
    fn on_signal(&self, signal: Signal) {
        if let Some(f) = &self.on_signal {
            f(signal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Ready = futures::future::Ready<Result<(), ProcessError>>;

    fn noop() -> ProcessFn<impl Fn(CancellationToken) -> Ready + Send + Sync + 'static> {
        ProcessFn::new("noop", |_ctx: CancellationToken| futures::future::ready(Ok(())))
    }

    #[test]
    fn bare_process_has_no_capabilities() {
        let p = noop();
        assert!(p.as_initializable().is_none());
        assert!(p.as_cleanable().is_none());
        assert!(p.as_run_timeout().is_none());
        assert!(p.as_signal_aware().is_none());
    }

    #[test]
    fn builder_switches_capabilities_on_with_their_timeouts() {
        let p = noop()
            .with_init(Duration::from_secs(1), |_ctx| async { Ok(()) })
            .with_run_timeout(Duration::from_secs(3))
            .with_cleanup(Duration::from_secs(2), |_ctx| async { Ok(()) })
            .with_on_signal(|_sig| {});

        let init = p.as_initializable().expect("init");
        assert_eq!(init.init_timeout(), Duration::from_secs(1));
        let cleanup = p.as_cleanable().expect("cleanup");
        assert_eq!(cleanup.cleanup_timeout(), Duration::from_secs(2));
        let run = p.as_run_timeout().expect("run timeout");
        assert_eq!(run.run_timeout(), Duration::from_secs(3));
        assert_eq!(p.run_timeout(), Duration::from_secs(3));
        assert!(p.as_signal_aware().is_some());
    }

    #[tokio::test]
    async fn hooks_receive_the_given_token() {
        let p = noop().with_cleanup(Duration::from_secs(1), |ctx: CancellationToken| async move {
            if ctx.is_cancelled() {
                Err(ProcessError::Canceled)
            } else {
                Ok(())
            }
        });
        let cleanup = p.as_cleanable().expect("cleanup");

        assert_eq!(cleanup.cleanup(CancellationToken::new()).await, Ok(()));

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(cleanup.cleanup(token).await, Err(ProcessError::Canceled));
    }
}
