//! # Event subscribers for the procvisor orchestrator.
//!
//! This module provides the [`Subscribe`] trait, the internal `SubscriberSet` fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Controller ── publish(Event) ──► Bus ──► subscriber_listener ──► SubscriberSet
//!                                                                        │
//!                                                           ┌────────────┼──────────┐
//!                                                           ▼            ▼          ▼
//!                                                       LogWriter     Metrics    Custom
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
pub(crate) use subscriber_set::SubscriberSet;
