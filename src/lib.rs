//! # procvisor
//!
//! **Procvisor** drives one unit of work through an `init → run → cleanup` lifecycle,
//! either once ([`Orchestrator::run`]) or as a loop ([`Orchestrator::run_worker`]),
//! and arbitrates between three cancellation sources:
//! - termination signals caught while the run is active,
//! - per-phase timeouts,
//! - the process's own return value.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            ┌────────────────────────────────────────────┐
//!            │  Process (user type / ProcessFn)           │
//!            │  run  [+ init] [+ cleanup] [+ run timeout] │
//!            │       [+ on_signal]                        │
//!            └──────────────────────┬─────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Orchestrator                                                     │
//! │  - ExecutionGuard (one run at a time)                             │
//! │  - Config (signal set, bus capacity)                              │
//! │  - Bus + SubscriberSet (lifecycle events)                         │
//! └──────┬─────────────────────────────────────────────┬──────────────┘
//!        ▼                                             ▼
//!   SignalListener (own task)                 single::run_once / worker::run_loop
//!   first signal ─► cancel root               (foreground, phases in sequence)
//!   second signal ─► default disposition (re-raised)
//! ```
//!
//! ### Lifecycle
//! ```text
//! guard.acquire()
//!   ├─► init      token = child(root)  + init timeout      Err ─► RunError::Init
//!   ├─► run       single: child(root) [+ run timeout]
//!   │             worker: fresh + run timeout per iteration,
//!   │                     root checked only between iterations
//!   │                       Fail            ─► RunError::Run (cleanup skipped)
//!   │                       Ok/Canceled/Timeout ─► cleanup
//!   └─► cleanup   token = fresh + cleanup timeout           Fail ─► RunError::Cleanup
//! guard released
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Processes**     | Mandatory run phase plus optional capabilities.               | [`Process`], [`Initializable`], [`Cleanable`]   |
//! | **Workers**       | Looped execution with a per-iteration timeout.                | [`Worker`], [`RunTimeout`]                      |
//! | **Signals**       | Configurable signal set, optional callback.                   | [`Signal`], [`SignalAware`]                     |
//! | **Errors**        | Phase outcomes and phase-tagged run errors.                   | [`ProcessError`], [`RunError`]                  |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).        | [`Subscribe`], [`Event`]                        |
//! | **Configuration** | Centralize orchestrator settings.                             | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber writing `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use procvisor::{Config, Orchestrator, ProcessError, ProcessFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orch = Orchestrator::new(Config::default());
//!
//!     // Poll three times, then report voluntary completion.
//!     let polls = Arc::new(AtomicU32::new(0));
//!     let counter = Arc::clone(&polls);
//!     let worker = ProcessFn::new("poller", move |ctx: CancellationToken| {
//!         let counter = Arc::clone(&counter);
//!         async move {
//!             if ctx.is_cancelled() {
//!                 return Err(ProcessError::Canceled);
//!             }
//!             if counter.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
//!                 return Err(ProcessError::Canceled);
//!             }
//!             Ok(())
//!         }
//!     })
//!     .with_cleanup(Duration::from_secs(1), |_ctx| async { Ok(()) })
//!     .with_run_timeout(Duration::from_secs(1));
//!
//!     orch.run_worker(Arc::new(worker)).await?;
//!     assert_eq!(polls.load(Ordering::SeqCst), 3);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod process;
mod subscribers;

// ---- Public re-exports ----

pub use core::{Config, Orchestrator, OrchestratorBuilder, Signal};
pub use error::{ProcessError, RunError};
pub use events::{Event, EventKind, RunMode};
pub use process::{
    Cleanable, Initializable, Phase, Process, ProcessFn, ProcessRef, RunBounded, RunTimeout,
    SignalAware, Unbounded, Worker,
};
pub use subscribers::Subscribe;

// Optional: expose a built-in `tracing` logger subscriber.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
