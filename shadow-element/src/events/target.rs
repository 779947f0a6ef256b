//! Event Targets
//!
//! A minimal event target: listeners are kept per event type in registration
//! order and invoked on a snapshot, so a listener may add or remove listeners
//! while an event is being dispatched without affecting that dispatch.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::Result;

/// A listener callback.
pub type Listener = Arc<dyn Fn(&Event) -> Result<()> + Send + Sync>;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// An event being dispatched.
#[derive(Debug, Default)]
pub struct Event {
    event_type: String,
    key: Option<String>,
    default_prevented: AtomicBool,
    propagation_stopped: AtomicBool,
    immediate_stopped: AtomicBool,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Self::default()
        }
    }

    /// A keyboard event carrying `key`.
    pub fn keyboard(event_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::SeqCst);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::SeqCst)
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.store(true, Ordering::SeqCst);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.load(Ordering::SeqCst)
    }

    /// Skip the remaining listeners on the current target.
    pub fn stop_immediate_propagation(&self) {
        self.immediate_stopped.store(true, Ordering::SeqCst);
        self.stop_propagation();
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_stopped.load(Ordering::SeqCst)
    }
}

struct Registration {
    id: ListenerId,
    event_type: String,
    listener: Listener,
}

#[derive(Default)]
struct TargetInner {
    label: String,
    listeners: RwLock<Vec<Registration>>,
}

/// Something listeners can be attached to: the document, the window, or an
/// element itself.
///
/// Cloning shares the listener list.
#[derive(Clone, Default)]
pub struct EventTarget {
    inner: Arc<TargetInner>,
}

impl EventTarget {
    /// Create a target. The label only shows up in logs.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TargetInner {
                label: label.into(),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn add_event_listener(&self, event_type: impl Into<String>, listener: Listener) -> ListenerId {
        let id = ListenerId::new();
        let event_type = event_type.into();
        trace!(source = %self.inner.label, %event_type, ?id, "listener added");

        self.inner.listeners.write().push(Registration {
            id,
            event_type,
            listener,
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|registration| registration.id != id);
        listeners.len() != before
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .listeners
            .read()
            .iter()
            .filter(|registration| registration.event_type == event_type)
            .count()
    }

    /// Invoke every listener registered for the event's type.
    ///
    /// Stops at the first listener error and returns it.
    pub fn dispatch(&self, event: &Event) -> Result<()> {
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .filter(|registration| registration.event_type == event.event_type())
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        trace!(
            source = %self.inner.label,
            event_type = event.event_type(),
            listeners = snapshot.len(),
            "dispatch"
        );

        for listener in snapshot {
            listener(event)?;
            if event.immediate_propagation_stopped() {
                break;
            }
        }
        Ok(())
    }

    pub(crate) fn downgrade(&self) -> WeakEventTarget {
        WeakEventTarget(Arc::downgrade(&self.inner))
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("label", &self.inner.label)
            .field("listeners", &self.inner.listeners.read().len())
            .finish()
    }
}

/// Non-owning reference to an [`EventTarget`].
#[derive(Clone)]
pub(crate) struct WeakEventTarget(Weak<TargetInner>);

impl WeakEventTarget {
    pub(crate) fn upgrade(&self) -> Option<EventTarget> {
        self.0.upgrade().map(|inner| EventTarget { inner })
    }
}
