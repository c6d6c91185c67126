#![allow(dead_code)]

use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use procvisor::{
    Cleanable, Event, EventKind, Initializable, Process, ProcessError, RunTimeout, Signal,
    SignalAware,
};

pub type Journal = Arc<Mutex<Vec<String>>>;

type RunStep =
    Box<dyn Fn(u32, CancellationToken) -> BoxFuture<'static, Result<(), ProcessError>> + Send + Sync>;
type PhaseStep =
    Box<dyn Fn(CancellationToken) -> BoxFuture<'static, Result<(), ProcessError>> + Send + Sync>;

/// Process implementing every capability by hand, recording each phase call.
pub struct Scripted {
    name: &'static str,
    journal: Journal,
    runs: AtomicU32,
    run: RunStep,
    init: Option<(Duration, PhaseStep)>,
    cleanup: Option<(Duration, PhaseStep)>,
    on_signal: Option<Box<dyn Fn(Signal) + Send + Sync>>,
    cleanup_tokens: Mutex<Vec<CancellationToken>>,
    run_tokens: Mutex<Vec<CancellationToken>>,
}

impl Scripted {
    /// `run` receives the 1-based call number and the phase token.
    pub fn new<F, Fut>(run: F) -> Self
    where
        F: Fn(u32, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        Self {
            name: "scripted",
            journal: Journal::default(),
            runs: AtomicU32::new(0),
            run: Box::new(move |n, ctx| run(n, ctx).boxed()),
            init: None,
            cleanup: None,
            on_signal: None,
            cleanup_tokens: Mutex::new(Vec::new()),
            run_tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn named(mut self, name: &'static str, journal: Journal) -> Self {
        self.name = name;
        self.journal = journal;
        self
    }

    pub fn with_init<F, Fut>(mut self, timeout: Duration, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        self.init = Some((timeout, Box::new(move |ctx| f(ctx).boxed())));
        self
    }

    pub fn with_cleanup<F, Fut>(mut self, timeout: Duration, f: F) -> Self
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProcessError>> + Send + 'static,
    {
        self.cleanup = Some((timeout, Box::new(move |ctx| f(ctx).boxed())));
        self
    }

    /// Adds a run timeout, which also makes the process usable as a worker.
    pub fn with_run_timeout(self, timeout: Duration) -> Timed {
        Timed {
            inner: self,
            timeout,
        }
    }

    pub fn with_on_signal(mut self, f: impl Fn(Signal) + Send + Sync + 'static) -> Self {
        self.on_signal = Some(Box::new(f));
        self
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, phase: &str) -> usize {
        let entry = format!("{}:{phase}", self.name);
        self.journal().iter().filter(|e| **e == entry).count()
    }

    pub fn run_tokens(&self) -> Vec<CancellationToken> {
        self.run_tokens.lock().unwrap().clone()
    }

    pub fn cleanup_tokens(&self) -> Vec<CancellationToken> {
        self.cleanup_tokens.lock().unwrap().clone()
    }

    fn record(&self, phase: &str) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{phase}", self.name));
    }
}

#[async_trait]
impl Process for Scripted {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        self.record("run");
        self.run_tokens.lock().unwrap().push(ctx.clone());
        (self.run)(n, ctx).await
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        self.init.as_ref().map(|_| self as &dyn Initializable)
    }

    fn as_cleanable(&self) -> Option<&dyn Cleanable> {
        self.cleanup.as_ref().map(|_| self as &dyn Cleanable)
    }

    fn as_signal_aware(&self) -> Option<&dyn SignalAware> {
        self.on_signal.as_ref().map(|_| self as &dyn SignalAware)
    }
}

#[async_trait]
impl Initializable for Scripted {
    async fn init(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        self.record("init");
        match &self.init {
            Some((_, step)) => step(ctx).await,
            None => Ok(()),
        }
    }

    fn init_timeout(&self) -> Duration {
        self.init.as_ref().map_or(Duration::ZERO, |(t, _)| *t)
    }
}

#[async_trait]
impl Cleanable for Scripted {
    async fn cleanup(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        self.record("cleanup");
        self.cleanup_tokens.lock().unwrap().push(ctx.clone());
        match &self.cleanup {
            Some((_, step)) => step(ctx).await,
            None => Ok(()),
        }
    }

    fn cleanup_timeout(&self) -> Duration {
        self.cleanup.as_ref().map_or(Duration::ZERO, |(t, _)| *t)
    }
}

/// [`Scripted`] with a run timeout.
pub struct Timed {
    inner: Scripted,
    timeout: Duration,
}

impl Deref for Timed {
    type Target = Scripted;

    fn deref(&self) -> &Scripted {
        &self.inner
    }
}

#[async_trait]
impl Process for Timed {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ProcessError> {
        self.inner.run(ctx).await
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        self.inner.as_initializable()
    }

    fn as_cleanable(&self) -> Option<&dyn Cleanable> {
        self.inner.as_cleanable()
    }

    fn as_run_timeout(&self) -> Option<&dyn RunTimeout> {
        Some(self)
    }

    fn as_signal_aware(&self) -> Option<&dyn SignalAware> {
        self.inner.as_signal_aware()
    }
}

impl RunTimeout for Timed {
    fn run_timeout(&self) -> Duration {
        self.timeout
    }
}

impl SignalAware for Scripted {
    fn on_signal(&self, signal: Signal) {
        if let Some(f) = &self.on_signal {
            f(signal);
        }
    }
}

/// Drains every event already published to `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

pub fn kinds(events: &[Event]) -> Vec<EventKind> {
    events.iter().map(|e| e.kind).collect()
}
