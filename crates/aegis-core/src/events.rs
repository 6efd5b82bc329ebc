//! Typed event fan-out.
//!
//! Handlers register per event kind and receive a deregistration handle.
//! Dispatch snapshots the handler list under the registry mutex, then
//! invokes each handler with the lock released, so handlers may register
//! or deregister (even themselves) while a dispatch is in progress.
//!
//! A panicking handler is caught and logged; it never prevents sibling
//! handlers from running and never reaches the emitting component.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, trace};

use aegis_contracts::event::{EventKind, GovernanceEvent};

/// A registered event handler. Handlers are plain function values keyed by
/// their subscription id; they receive events by reference and must not
/// assume exclusive access to anything.
pub type EventHandler = dyn Fn(&GovernanceEvent) + Send + Sync;

/// Deregistration handle returned by `subscribe`.
///
/// Dropping the handle does NOT deregister; pass it back to
/// `unsubscribe`. This keeps handler lifetimes explicit and avoids a
/// handler-holds-dispatcher-holds-handler cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscription {
    id: u64,
    kind: EventKind,
}

impl EventSubscription {
    /// The kind this subscription listens for.
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// The fan-out registry shared by every component of one orchestrator.
///
/// Mission Control hands one `Arc<EventDispatcher>` to the enforcement
/// engine, the approval workflow, and the audit trail, so subscribing
/// once observes the whole kernel.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Mutex<HashMap<EventKind, Vec<(u64, Arc<EventHandler>)>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`; returns the deregistration handle.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> EventSubscription
    where
        F: Fn(&GovernanceEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.handlers.lock().expect("event registry lock poisoned");
        handlers
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        EventSubscription { id, kind }
    }

    /// Remove the handler behind `subscription`. Unknown handles no-op.
    pub fn unsubscribe(&self, subscription: &EventSubscription) {
        let mut handlers = self.handlers.lock().expect("event registry lock poisoned");
        if let Some(list) = handlers.get_mut(&subscription.kind) {
            list.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Deliver `event` to every handler registered for its kind.
    pub fn emit(&self, event: &GovernanceEvent) {
        let snapshot: Vec<Arc<EventHandler>> = {
            let handlers = self.handlers.lock().expect("event registry lock poisoned");
            handlers
                .get(&event.kind)
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };

        trace!(
            kind = %event.kind,
            severity = %event.severity,
            handlers = snapshot.len(),
            "dispatching governance event"
        );

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                error!(kind = %event.kind, "event handler panicked; continuing dispatch");
            }
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.lock().expect("event registry lock poisoned");
        handlers.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use chrono::Utc;
    use serde_json::json;

    use aegis_contracts::event::Severity;

    use super::*;

    fn make_event(kind: EventKind) -> GovernanceEvent {
        GovernanceEvent::new(kind, Severity::Info, Utc::now(), json!({}))
    }

    #[test]
    fn handlers_receive_their_kind_only() {
        let dispatcher = EventDispatcher::new();
        let executed = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        let e = executed.clone();
        dispatcher.subscribe(EventKind::ActionExecuted, move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });
        let f = failed.clone();
        dispatcher.subscribe(EventKind::ActionFailed, move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.emit(&make_event(EventKind::ActionExecuted));

        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(failed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let sub = dispatcher.subscribe(EventKind::ActionExecuted, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.emit(&make_event(EventKind::ActionExecuted));
        dispatcher.unsubscribe(&sub);
        dispatcher.emit(&make_event(EventKind::ActionExecuted));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(dispatcher.handler_count(EventKind::ActionExecuted), 0);
    }

    /// One bad handler must never prevent sibling handlers from running.
    #[test]
    fn panicking_handler_does_not_block_siblings() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(AtomicUsize::new(0));

        dispatcher.subscribe(EventKind::ActionExecuted, |_| panic!("bad handler"));
        let c = count.clone();
        dispatcher.subscribe(EventKind::ActionExecuted, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.emit(&make_event(EventKind::ActionExecuted));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    /// Deregistration while dispatch is in progress is safe: the dispatch
    /// snapshot is taken before handlers run.
    #[test]
    fn handler_may_unsubscribe_itself_during_dispatch() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let count = Arc::new(AtomicUsize::new(0));

        let slot: Arc<Mutex<Option<EventSubscription>>> = Arc::new(Mutex::new(None));
        let d = dispatcher.clone();
        let s = slot.clone();
        let c = count.clone();
        let sub = dispatcher.subscribe(EventKind::ActionExecuted, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().unwrap().take() {
                d.unsubscribe(&sub);
            }
        });
        *slot.lock().unwrap() = Some(sub);

        dispatcher.emit(&make_event(EventKind::ActionExecuted));
        dispatcher.emit(&make_event(EventKind::ActionExecuted));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
