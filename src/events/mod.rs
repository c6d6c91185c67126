//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the orchestrator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`RunMode`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Orchestrator` controllers, `SignalListener`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Orchestrator::subscriber_listener()` (fans out to `SubscriberSet`)
//!   and receivers from `Orchestrator::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, RunMode};
