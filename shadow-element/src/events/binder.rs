//! Lifecycle Event Binding
//!
//! Element types declare which listeners they need while they are attached:
//! a table of `{ source -> { event type -> handler } }`. The table is built at
//! registration time, before any instance exists, so a handler may name one of
//! the instance's own methods instead of holding a callback. Such names are
//! resolved against the instance through [`MethodResolver`] when the binding is
//! made.
//!
//! Every binding returns a [`Cleanup`] that removes exactly that listener.
//! Running a cleanup twice does nothing the second time.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::trace;

use super::target::{Event, EventTarget, Listener};
use crate::error::{Error, Result};

/// Where a lifecycle listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventSource {
    Document,
    Window,
    /// The element itself.
    Host,
}

/// A declared event handler.
#[derive(Clone)]
pub enum Handler {
    /// A callback known at declaration time.
    Direct(Listener),
    /// The name of a method looked up on the instance at bind time.
    Method(String),
}

impl Handler {
    pub fn direct<F>(f: F) -> Self
    where
        F: Fn(&Event) -> Result<()> + Send + Sync + 'static,
    {
        Self::Direct(Arc::new(f))
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::Method(name.into())
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Direct(..)"),
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
        }
    }
}

// Configuration files can only name methods.
impl<'de> Deserialize<'de> for Handler {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Method)
    }
}

/// Looks up an instance's methods by name.
pub trait MethodResolver {
    fn resolve_method(&self, name: &str) -> Option<Listener>;
}

/// Resolver for contexts with no instance; every lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMethods;

impl MethodResolver for NoMethods {
    fn resolve_method(&self, _name: &str) -> Option<Listener> {
        None
    }
}

/// Declared lifecycle listeners of an element type, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct LifecycleEventMap {
    sources: IndexMap<EventSource, IndexMap<String, Handler>>,
}

impl LifecycleEventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a handler. A second handler for the same source and type
    /// replaces the first.
    pub fn on(&mut self, source: EventSource, event_type: impl Into<String>, handler: Handler) {
        self.sources
            .entry(source)
            .or_default()
            .insert(event_type.into(), handler);
    }

    pub fn events(&self, source: EventSource) -> Option<&IndexMap<String, Handler>> {
        self.sources.get(&source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventSource, &IndexMap<String, Handler>)> {
        self.sources.iter().map(|(source, events)| (*source, events))
    }

    /// Total number of declared bindings.
    pub fn len(&self) -> usize {
        self.sources.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer `own` on top of `parent`. Parent entries keep their position;
    /// entries declared by `own` for the same source and type replace them.
    pub fn merged(parent: &Self, own: &Self) -> Self {
        let mut merged = parent.clone();
        for (source, events) in own.iter() {
            for (event_type, handler) in events {
                merged.on(source, event_type.clone(), handler.clone());
            }
        }
        merged
    }
}

/// Removes one listener. Idempotent.
pub struct Cleanup {
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Cleanup {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            action: Mutex::new(Some(Box::new(action))),
        }
    }

    /// Run the cleanup. Returns `false` if it had already run.
    pub fn run(&self) -> bool {
        let action = self.action.lock().take();
        match action {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }

    pub fn has_run(&self) -> bool {
        self.action.lock().is_none()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").field("has_run", &self.has_run()).finish()
    }
}

/// Attaches declared handlers to event targets.
pub struct EventBinder<'a> {
    resolver: &'a dyn MethodResolver,
}

impl<'a> EventBinder<'a> {
    pub fn new(resolver: &'a dyn MethodResolver) -> Self {
        Self { resolver }
    }

    /// Attach `handler` to `target` for `event_type`.
    pub fn bind(&self, target: &EventTarget, event_type: &str, handler: &Handler) -> Result<Cleanup> {
        let listener = match handler {
            Handler::Direct(listener) => Arc::clone(listener),
            Handler::Method(name) => self
                .resolver
                .resolve_method(name)
                .ok_or_else(|| Error::UnresolvedMethod(name.clone()))?,
        };

        let id = target.add_event_listener(event_type, listener);
        let weak = target.downgrade();
        let label = target.label().to_string();
        let event_type = event_type.to_string();

        Ok(Cleanup::new(move || {
            if let Some(target) = weak.upgrade() {
                target.remove_event_listener(id);
                trace!(source = %label, %event_type, "listener removed");
            }
        }))
    }

    /// Attach every handler in `events`, returning the cleanups in the same
    /// order.
    ///
    /// If one binding fails, the ones already made are removed again before
    /// the error is returned.
    pub fn bind_all(&self, target: &EventTarget, events: &IndexMap<String, Handler>) -> Result<Vec<Cleanup>> {
        let mut cleanups = Vec::with_capacity(events.len());

        for (event_type, handler) in events {
            match self.bind(target, event_type, handler) {
                Ok(cleanup) => cleanups.push(cleanup),
                Err(err) => {
                    for cleanup in &cleanups {
                        cleanup.run();
                    }
                    return Err(err);
                }
            }
        }

        Ok(cleanups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI32, Ordering};

    struct Methods(HashMap<&'static str, Listener>);

    impl MethodResolver for Methods {
        fn resolve_method(&self, name: &str) -> Option<Listener> {
            self.0.get(name).cloned()
        }
    }

    fn counting(count: &Arc<AtomicI32>) -> Listener {
        let count = count.clone();
        Arc::new(move |_: &Event| {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn bind_then_cleanup_removes_listener() {
        let target = EventTarget::new("document");
        let clicks = Arc::new(AtomicI32::new(0));
        let binder = EventBinder::new(&NoMethods);

        let cleanup = binder
            .bind(&target, "click", &Handler::Direct(counting(&clicks)))
            .unwrap();

        target.dispatch(&Event::new("click")).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        assert!(cleanup.run());
        target.dispatch(&Event::new("click")).unwrap();
        assert_eq!(clicks.load(Ordering::SeqCst), 1);
        assert_eq!(target.listener_count("click"), 0);
    }

    #[test]
    fn cleanup_twice_is_noop() {
        let target = EventTarget::new("window");
        let binder = EventBinder::new(&NoMethods);

        let first = binder.bind(&target, "click", &Handler::direct(|_| Ok(()))).unwrap();
        let _second = binder.bind(&target, "click", &Handler::direct(|_| Ok(()))).unwrap();

        assert!(first.run());
        assert!(!first.run());
        assert!(first.has_run());

        // The other binding is untouched
        assert_eq!(target.listener_count("click"), 1);
    }

    #[test]
    fn method_handlers_resolve_at_bind_time() {
        let target = EventTarget::new("host");
        let presses = Arc::new(AtomicI32::new(0));
        let methods = Methods(HashMap::from([("onKey", counting(&presses))]));
        let binder = EventBinder::new(&methods);

        let _cleanup = binder.bind(&target, "keypress", &Handler::method("onKey")).unwrap();
        target.dispatch(&Event::new("keypress")).unwrap();

        assert_eq!(presses.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unresolved_method_is_an_error() {
        let target = EventTarget::new("host");
        let binder = EventBinder::new(&NoMethods);

        let err = binder
            .bind(&target, "click", &Handler::method("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedMethod(name) if name == "missing"));
        assert_eq!(target.listener_count("click"), 0);
    }

    #[test]
    fn bind_all_preserves_order_and_rolls_back() {
        let target = EventTarget::new("document");
        let binder = EventBinder::new(&NoMethods);

        let mut events = IndexMap::new();
        events.insert("click".to_string(), Handler::direct(|_| Ok(())));
        events.insert("keypress".to_string(), Handler::direct(|_| Ok(())));

        let cleanups = binder.bind_all(&target, &events).unwrap();
        assert_eq!(cleanups.len(), 2);
        assert_eq!(target.listener_count("click"), 1);
        assert_eq!(target.listener_count("keypress"), 1);

        cleanups.iter().for_each(|cleanup| {
            cleanup.run();
        });

        events.insert("scroll".to_string(), Handler::method("missing"));
        assert!(binder.bind_all(&target, &events).is_err());
        assert_eq!(target.listener_count("click"), 0);
        assert_eq!(target.listener_count("keypress"), 0);
    }

    #[test]
    fn merged_map_lets_child_override() {
        let mut parent = LifecycleEventMap::new();
        parent.on(EventSource::Document, "click", Handler::method("parentClick"));
        parent.on(EventSource::Window, "resize", Handler::method("onResize"));

        let mut own = LifecycleEventMap::new();
        own.on(EventSource::Document, "click", Handler::method("childClick"));
        own.on(EventSource::Host, "keypress", Handler::method("onKey"));

        let merged = LifecycleEventMap::merged(&parent, &own);
        assert_eq!(merged.len(), 3);

        let document = merged.events(EventSource::Document).unwrap();
        assert!(matches!(&document["click"], Handler::Method(name) if name == "childClick"));

        let order: Vec<_> = merged.iter().map(|(source, _)| source).collect();
        assert_eq!(order, vec![EventSource::Document, EventSource::Window, EventSource::Host]);
    }

    #[test]
    fn map_deserializes_method_names() {
        let map: LifecycleEventMap = serde_json::from_str(
            r#"{ "document": { "click": "onDocumentClick" }, "window": { "click": "onWindowClick" } }"#,
        )
        .unwrap();

        assert_eq!(map.len(), 2);
        let window = map.events(EventSource::Window).unwrap();
        assert!(matches!(&window["click"], Handler::Method(name) if name == "onWindowClick"));
    }
}
