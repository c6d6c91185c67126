//! # Fan-out of bus events to subscribers.
//!
//! The orchestrator's subscriber listener owns one [`SubscriberSet`] and hands it
//! every event it receives from the bus. Each subscriber has its own bounded queue
//! and worker task:
//!
//! ```text
//! emit(event) ──► Arc<Event> ──┬──► [queue] ──► worker ──► LogWriter::on_event
//!                              └──► [queue] ──► worker ──► Custom::on_event
//! ```
//!
//! ## Rules
//! - `emit` never waits: a full queue drops the event for that subscriber only and
//!   publishes `SubscriberOverflow`, naming the dropped run event.
//! - Each subscriber sees events in publish order; there is no ordering across subscribers.
//! - A panicking `on_event` is reported as `SubscriberPanicked`; the worker keeps going.
//!   `AssertUnwindSafe` is used, so a subscriber that panics while holding a lock may
//!   leave its own state poisoned.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

/// Queue and worker of one subscriber.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
    worker: JoinHandle<()>,
}

/// Subscribers registered on an orchestrator.
pub(crate) struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called inside a tokio runtime.
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Self::lane(sub, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    fn lane(sub: Arc<dyn Subscribe>, bus: Bus) -> Lane {
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
        let worker = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                if let Err(panic) = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await {
                    bus.publish(Event::subscriber_panicked(name, panic_message(panic.as_ref())));
                }
            }
        });
        Lane { name, tx, worker }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues `event` for every subscriber.
    ///
    /// Overflow reports are not themselves reported when they overflow.
    pub(crate) fn emit(&self, event: Event) {
        let event = Arc::new(event);
        let report = event.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if report {
                self.bus
                    .publish(Event::subscriber_overflow(lane.name, reason, &event));
            }
        }
    }

    /// Closes every queue, then waits until the workers have drained them.
    pub(crate) async fn shutdown(self) {
        let (senders, workers): (Vec<_>, Vec<_>) =
            self.lanes.into_iter().map(|l| (l.tx, l.worker)).unzip();
        drop(senders);
        join_all(workers).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::process::Phase;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<EventKind>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploding;

    #[async_trait]
    impl Subscribe for Exploding {
        async fn on_event(&self, _ev: &Event) {
            panic!("subscriber bug");
        }

        fn name(&self) -> &'static str {
            "exploding"
        }
    }

    /// Holds each event until released; queue of one.
    #[derive(Default)]
    struct Gated {
        gate: Notify,
    }

    #[async_trait]
    impl Subscribe for Gated {
        async fn on_event(&self, _ev: &Event) {
            self.gate.notified().await;
        }

        fn name(&self) -> &'static str {
            "gated"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn shutdown_delivers_queued_events_in_order() {
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![rec.clone()], Bus::new(16));

        set.emit(Event::new(EventKind::RunStarting));
        set.emit(Event::new(EventKind::PhaseStarting));
        set.emit(Event::new(EventKind::RunFinished));
        set.shutdown().await;

        assert_eq!(
            *rec.seen.lock().unwrap(),
            vec![
                EventKind::RunStarting,
                EventKind::PhaseStarting,
                EventKind::RunFinished
            ]
        );
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported_and_isolated() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let rec = Arc::new(Recorder::default());
        let set = SubscriberSet::new(vec![Arc::new(Exploding), rec.clone()], bus);

        set.emit(Event::new(EventKind::RunStarting));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.process.as_deref(), Some("exploding"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber bug"));
        assert_eq!(*rec.seen.lock().unwrap(), vec![EventKind::RunStarting]);
    }

    #[tokio::test]
    async fn overflow_names_the_dropped_run_event() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let gated = Arc::new(Gated::default());
        let set = SubscriberSet::new(vec![gated.clone()], bus);

        set.emit(Event::new(EventKind::RunStarting));
        set.emit(
            Event::new(EventKind::PhaseStarting)
                .with_process("indexer")
                .with_phase(Phase::Run)
                .with_iteration(7),
        );

        let ev = rx.try_recv().expect("overflow event");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.process.as_deref(), Some("gated"));
        assert_eq!(ev.phase, Some(Phase::Run));
        assert_eq!(ev.iteration, Some(7));
        let reason = ev.reason.as_deref().unwrap_or_default();
        assert!(reason.contains("reason=full"), "{reason}");
        assert!(reason.contains("dropped=PhaseStarting"), "{reason}");
        assert!(reason.contains("of=indexer"), "{reason}");

        gated.gate.notify_one();
        set.shutdown().await;
    }
}
