//! # Orchestrator: drives a process through its lifecycle under signals and timeouts.
//!
//! The [`Orchestrator`] owns the event bus, the execution guard, the signal set and
//! the subscriber fan-out. Each call to [`Orchestrator::run`] or
//! [`Orchestrator::run_worker`] is one pass through the lifecycle.
//!
//! ## Run sequence
//! ```text
//! run(process) / run_worker(worker)
//!   ├─► guard.acquire()                      (waits while another run is active)
//!   ├─► root = CancellationToken::new()
//!   ├─► publish RunStarting
//!   ├─► SignalListener::spawn(signals, root) (setup error ─► RunError::SignalSetup)
//!   ├─► single::run_once(ctx)  |  worker::run_loop(ctx)
//!   ├─► publish RunFinished / RunFailed
//!   └─► drop: listener aborted, guard released
//! ```
//!
//! ## Cancellation sources
//! ```text
//! signal ──► root ──┬─► init token            (child + init timeout)
//!                   └─► single run token      (child + optional run timeout)
//!
//! worker iteration token: fresh + run timeout (root checked between iterations)
//! cleanup token:          fresh + cleanup timeout
//! process return value:   Ok / Canceled / Timeout (soft)  vs  Fail (hard)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{Config, Orchestrator, ProcessError, ProcessFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new(Config::default());
//!
//!     let job = ProcessFn::arc("job", |ctx: CancellationToken| async move {
//!         tokio::select! {
//!             _ = ctx.cancelled() => Err(ProcessError::Canceled),
//!             _ = tokio::time::sleep(Duration::from_millis(10)) => Ok(()),
//!         }
//!     });
//!
//!     orch.run(job).await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        builder::OrchestratorBuilder, config::Config, guard::ExecutionGuard,
        runner::RunContext, signals::Signal, signals::SignalListener, single, worker,
    },
    error::RunError,
    events::{Bus, Event, EventKind, RunMode},
    process::{Process, Worker},
    subscribers::SubscriberSet,
};

/// Runs processes one at a time, arbitrating signals, timeouts and process outcomes.
pub struct Orchestrator {
    cfg: Config,
    bus: Bus,
    guard: ExecutionGuard,
    /// Stops the subscriber listener on [`Orchestrator::shutdown`].
    stop: CancellationToken,
    listener: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Returns a builder for an orchestrator with subscribers.
    pub fn builder(cfg: Config) -> OrchestratorBuilder {
        OrchestratorBuilder::new(cfg)
    }

    /// Creates an orchestrator without subscribers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(cfg: Config) -> Self {
        OrchestratorBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(cfg: Config, bus: Bus, subs: SubscriberSet) -> Self {
        let stop = CancellationToken::new();
        let listener = if subs.is_empty() {
            None
        } else {
            Some(Self::subscriber_listener(&bus, subs, stop.clone()))
        };
        Self {
            cfg,
            bus,
            guard: ExecutionGuard::new(),
            stop,
            listener,
        }
    }

    /// Returns the signals intercepted by subsequent runs.
    pub fn signals(&self) -> &[Signal] {
        &self.cfg.signals
    }

    /// Replaces the signals intercepted by subsequent runs.
    ///
    /// Requires exclusive access, so it cannot change the set under an active run.
    pub fn set_signals(&mut self, signals: impl IntoIterator<Item = Signal>) {
        self.cfg.signals = signals.into_iter().collect();
    }

    /// Returns `true` while a run holds the execution guard.
    pub fn is_running(&self) -> bool {
        self.guard.is_held()
    }

    /// Creates a raw receiver for events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Executes `init → run → cleanup` once.
    ///
    /// Waits for any active run on this orchestrator to finish first.
    ///
    /// ### Errors
    /// - [`RunError::Init`]: init failed or was cancelled; run and cleanup did not execute.
    /// - [`RunError::Run`]: run failed; cleanup did not execute.
    /// - [`RunError::Cleanup`]: run succeeded (or ended softly) but cleanup failed.
    /// - [`RunError::SignalSetup`]: signals could not be installed; nothing executed.
    pub async fn run<P: Process + ?Sized>(&self, process: Arc<P>) -> Result<(), RunError> {
        let _permit = self.guard.acquire().await;
        let root = CancellationToken::new();
        let ctx = RunContext::new(process.as_ref(), &root, &self.bus);
        self.bus
            .publish(ctx.event(EventKind::RunStarting).with_mode(RunMode::Single));

        let _signals = match SignalListener::spawn(
            &self.cfg.signals,
            root.clone(),
            Arc::clone(&process),
            self.bus.clone(),
        ) {
            Ok(listener) => listener,
            Err(source) => {
                let res = Err(RunError::SignalSetup { source });
                return self.finish(&ctx, RunMode::Single, None, res);
            }
        };

        let res = single::run_once(&ctx).await;
        self.finish(&ctx, RunMode::Single, None, res)
    }

    /// Executes init once, then the process body in a loop, then cleanup.
    ///
    /// Each iteration gets a fresh token bounded by [`RunTimeout::run_timeout`](crate::RunTimeout::run_timeout).
    /// A caught signal is honored after the current iteration returns.
    ///
    /// ### Errors
    /// Same as [`Orchestrator::run`]; `RunError::Run` carries the failure of the
    /// iteration that ended the loop.
    pub async fn run_worker<W: Worker + ?Sized>(&self, worker: Arc<W>) -> Result<(), RunError> {
        let _permit = self.guard.acquire().await;
        let root = CancellationToken::new();
        let ctx = RunContext::worker(worker.as_ref(), &root, &self.bus);
        self.bus
            .publish(ctx.event(EventKind::RunStarting).with_mode(RunMode::Worker));

        let _signals = match SignalListener::spawn(
            &self.cfg.signals,
            root.clone(),
            Arc::clone(&worker),
            self.bus.clone(),
        ) {
            Ok(listener) => listener,
            Err(source) => {
                let res = Err(RunError::SignalSetup { source });
                return self.finish(&ctx, RunMode::Worker, Some(0), res);
            }
        };

        let out = worker::run_loop(&ctx).await;
        self.finish(&ctx, RunMode::Worker, Some(out.iterations), out.result)
    }

    /// Drains pending events to subscribers and waits for their workers to finish.
    pub async fn shutdown(self) {
        self.stop.cancel();
        if let Some(listener) = self.listener {
            let _ = listener.await;
        }
    }

    /// Publishes the terminal run event and passes the result through.
    fn finish<P: Process + ?Sized>(
        &self,
        ctx: &RunContext<'_, P>,
        mode: RunMode,
        iterations: Option<u64>,
        res: Result<(), RunError>,
    ) -> Result<(), RunError> {
        let ev = match &res {
            Ok(()) => ctx.event(EventKind::RunFinished),
            Err(e) => {
                let ev = ctx.event(EventKind::RunFailed).with_reason(e.to_string());
                match e.phase() {
                    Some(phase) => ev.with_phase(phase),
                    None => ev,
                }
            }
        };
        self.bus
            .publish(ev.with_mode(mode).with_iteration_opt(iterations));
        res
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// On stop, already published events are still delivered before the set shuts down.
    fn subscriber_listener(bus: &Bus, set: SubscriberSet, stop: CancellationToken) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            while let Ok(ev) = rx.try_recv() {
                set.emit(ev);
            }
            set.shutdown().await;
        })
    }
}
