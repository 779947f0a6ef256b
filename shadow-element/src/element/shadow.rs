//! Shadow Element Lifecycle
//!
//! A [`ShadowElement`] ties a frozen [`ElementDefinition`] to one instance's
//! state: its attributes, its render-property values, its shadow root, its
//! debouncer and the cleanups of its lifecycle listeners.
//!
//! # States
//!
//! ```text
//!            connected_callback
//! Unattached ------------------> Active
//!     ^                            |
//!     +----------------------------+
//!           disconnected_callback
//! ```
//!
//! An element may move between the two states any number of times.
//!
//! - Attaching binds every declared lifecycle listener and renders
//!   immediately.
//! - Any observed attribute change or render-property assignment requests a
//!   debounced render.
//! - Detaching runs every cleanup exactly once, in registration order. With
//!   [`DetachPolicy::CancelPending`] a pending debounced render is dropped.
//!
//! Attaching an attached element and detaching a detached one are no-ops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::{debug, trace};

use super::environment::Environment;
use super::render::{Markup, ShadowRoot};
use crate::error::{Error, Result};
use crate::events::{Cleanup, Event, EventBinder, EventSource, EventTarget, Listener, MethodResolver};
use crate::reflect::{AttributeWrite, DetachPolicy, ElementDefinition, PropValue, PropertyDescriptor, ShadowRootMode};
use crate::schedule::{Action, Debouncer};

/// The element author's side of an element: its template and its methods.
pub trait ElementBehavior: Send + Sync + 'static {
    /// Produce the markup for the element's current state.
    fn template(&self, element: &ShadowElement) -> Result<Markup>;

    /// Look up a method named by a lifecycle handler.
    ///
    /// Called when the element attaches. The returned listener usually
    /// captures `element` to reach the instance.
    fn method(&self, name: &str, element: &WeakElement) -> Option<Listener> {
        let _ = (name, element);
        None
    }
}

impl<F> ElementBehavior for F
where
    F: Fn(&ShadowElement) -> Result<Markup> + Send + Sync + 'static,
{
    fn template(&self, element: &ShadowElement) -> Result<Markup> {
        self(element)
    }
}

/// Unique identifier for an element instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(u64);

impl ElementId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Where an element is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unattached,
    Active,
}

struct Lifecycle {
    state: LifecycleState,
    cleanups: SmallVec<[Cleanup; 4]>,
}

struct ElementInner {
    id: ElementId,
    definition: Arc<ElementDefinition>,
    behavior: Arc<dyn ElementBehavior>,
    env: Environment,
    host: EventTarget,
    attributes: RwLock<IndexMap<String, String>>,
    render_values: RwLock<HashMap<String, PropValue>>,
    shadow_root: ShadowRoot,
    debouncer: Debouncer,
    lifecycle: Mutex<Lifecycle>,
    renders: AtomicU64,
}

/// An element instance. Cloning shares the instance.
#[derive(Clone)]
pub struct ShadowElement {
    inner: Arc<ElementInner>,
}

impl ShadowElement {
    /// Construct an unattached instance of `definition`.
    pub fn new(definition: Arc<ElementDefinition>, behavior: Arc<dyn ElementBehavior>, env: &Environment) -> Self {
        let id = ElementId::new();
        let shadow_root = ShadowRoot::new(definition.shadow_mode(), definition.styles().to_vec());
        let debounce = definition.debounce();
        let scheduler = Arc::clone(env.scheduler());

        let inner = Arc::new_cyclic(|weak: &Weak<ElementInner>| {
            let weak = weak.clone();
            let action: Action = Arc::new(move || match weak.upgrade() {
                Some(inner) => ShadowElement { inner }.render_callback(),
                None => Ok(()),
            });

            ElementInner {
                id,
                definition,
                behavior,
                env: env.clone(),
                host: EventTarget::new(format!("element#{}", id.0)),
                attributes: RwLock::new(IndexMap::new()),
                render_values: RwLock::new(HashMap::new()),
                shadow_root,
                debouncer: Debouncer::new(action, debounce, scheduler),
                lifecycle: Mutex::new(Lifecycle {
                    state: LifecycleState::Unattached,
                    cleanups: SmallVec::new(),
                }),
                renders: AtomicU64::new(0),
            }
        });

        trace!(?id, "element constructed");
        Self { inner }
    }

    pub fn id(&self) -> ElementId {
        self.inner.id
    }

    pub fn definition(&self) -> &Arc<ElementDefinition> {
        &self.inner.definition
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.lifecycle.lock().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == LifecycleState::Active
    }

    /// The element itself as an event source.
    pub fn host(&self) -> &EventTarget {
        &self.inner.host
    }

    pub fn dispatch_event(&self, event: &Event) -> Result<()> {
        self.inner.host.dispatch(event)
    }

    /// The shadow root as seen from outside: `None` when it is closed.
    pub fn shadow_root(&self) -> Option<&ShadowRoot> {
        match self.inner.shadow_root.mode() {
            ShadowRootMode::Open => Some(&self.inner.shadow_root),
            ShadowRootMode::Closed => None,
        }
    }

    /// The shadow root regardless of mode, for the element's own use.
    pub fn mount_point(&self) -> &ShadowRoot {
        &self.inner.shadow_root
    }

    /// Number of times the render procedure ran.
    pub fn render_count(&self) -> u64 {
        self.inner.renders.load(Ordering::SeqCst)
    }

    pub fn has_pending_render(&self) -> bool {
        self.inner.debouncer.is_pending()
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner
            .attributes
            .read()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner
            .attributes
            .read()
            .contains_key(&name.to_ascii_lowercase())
    }

    /// Attribute names in insertion order.
    pub fn attribute_names(&self) -> Vec<String> {
        self.inner.attributes.read().keys().cloned().collect()
    }

    /// Set an attribute. Observed attributes notify the element even when the
    /// value is unchanged.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let value = value.into();
        let old = self
            .inner
            .attributes
            .write()
            .insert(name.clone(), value.clone());

        if self.inner.definition.is_observed(&name) {
            self.attribute_changed_callback(&name, old.as_deref(), Some(&value))?;
        }
        Ok(())
    }

    /// Remove an attribute. Removing an absent attribute does nothing.
    pub fn remove_attribute(&self, name: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let Some(old) = self.inner.attributes.write().shift_remove(&name) else {
            return Ok(());
        };

        if self.inner.definition.is_observed(&name) {
            self.attribute_changed_callback(&name, Some(&old), None)?;
        }
        Ok(())
    }

    /// Toggle a presence attribute. Returns whether it is now present.
    pub fn toggle_attribute(&self, name: &str, force: Option<bool>) -> Result<bool> {
        let present = force.unwrap_or_else(|| !self.has_attribute(name));
        if present {
            if !self.has_attribute(name) {
                self.set_attribute(name, "")?;
            }
        } else {
            self.remove_attribute(name)?;
        }
        Ok(present)
    }

    /// Called for every mutation of an observed attribute.
    pub fn attribute_changed_callback(&self, name: &str, old: Option<&str>, new: Option<&str>) -> Result<()> {
        trace!(id = ?self.inner.id, attribute = name, ?old, ?new, "observed attribute changed");
        self.request_render(false)
    }

    // ------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------

    fn descriptor(&self, name: &str) -> Result<&PropertyDescriptor> {
        self.inner
            .definition
            .property(name)
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }

    /// Read a declared property.
    pub fn get(&self, name: &str) -> Result<PropValue> {
        let descriptor = self.descriptor(name)?;

        Ok(match descriptor.attribute() {
            Some(attribute) => {
                let attributes = self.inner.attributes.read();
                descriptor.read(attributes.get(attribute.as_str()).map(String::as_str))
            }
            None => self
                .inner
                .render_values
                .read()
                .get(name)
                .cloned()
                .unwrap_or_else(|| descriptor.default_value().clone()),
        })
    }

    /// Assign a declared property.
    ///
    /// Reflected properties write their attribute; the attribute change
    /// requests the render. Render properties store the value and request a
    /// render themselves.
    pub fn set(&self, name: &str, value: impl Into<PropValue>) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        let value = value.into();

        match (descriptor.attribute(), descriptor.write(&value)) {
            (Some(attribute), Some(AttributeWrite::Set(text))) => self.set_attribute(attribute.as_str(), text),
            (Some(attribute), Some(AttributeWrite::Remove)) => self.remove_attribute(attribute.as_str()),
            _ => {
                self.inner
                    .render_values
                    .write()
                    .insert(name.to_string(), value);
                self.request_render(false)
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Request a render. Immediate requests render before returning and pass
    /// the render's result through; others are debounced.
    pub fn request_render(&self, immediate: bool) -> Result<()> {
        self.inner.debouncer.run(immediate)
    }

    fn render_callback(&self) -> Result<()> {
        let renders = self.inner.renders.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(id = ?self.inner.id, renders, "rendering");

        let template = || self.inner.behavior.template(self);
        self.inner
            .env
            .renderer()
            .render(&self.inner.shadow_root, &template)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn source_target(&self, source: EventSource) -> EventTarget {
        match self.inner.env.global_target(source) {
            Some(target) => target.clone(),
            None => self.inner.host.clone(),
        }
    }

    /// The element became active: bind lifecycle listeners, then render
    /// without waiting for the debounce window.
    ///
    /// If a listener cannot be bound the error is returned; listeners bound
    /// before it stay registered until the next detach.
    pub fn connected_callback(&self) -> Result<()> {
        {
            let mut lifecycle = self.inner.lifecycle.lock();
            if lifecycle.state == LifecycleState::Active {
                trace!(id = ?self.inner.id, "already attached");
                return Ok(());
            }
            lifecycle.state = LifecycleState::Active;
        }

        let binder = EventBinder::new(self);
        for (source, events) in self.inner.definition.lifecycle_events().iter() {
            let target = self.source_target(source);
            let cleanups = binder.bind_all(&target, events)?;
            self.inner.lifecycle.lock().cleanups.extend(cleanups);
        }

        debug!(
            id = ?self.inner.id,
            listeners = self.inner.lifecycle.lock().cleanups.len(),
            "element attached"
        );
        self.request_render(true)
    }

    /// The element became inactive: remove every lifecycle listener.
    pub fn disconnected_callback(&self) {
        let cleanups = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if lifecycle.state == LifecycleState::Unattached {
                return;
            }
            lifecycle.state = LifecycleState::Unattached;
            std::mem::take(&mut lifecycle.cleanups)
        };

        let cancelled = match self.inner.definition.detach_policy() {
            DetachPolicy::CancelPending => self.inner.debouncer.cancel(),
            DetachPolicy::LetPendingFire => false,
        };

        for cleanup in &cleanups {
            cleanup.run();
        }
        debug!(
            id = ?self.inner.id,
            listeners = cleanups.len(),
            cancelled_render = cancelled,
            "element detached"
        );
    }
}

impl MethodResolver for ShadowElement {
    fn resolve_method(&self, name: &str) -> Option<Listener> {
        self.inner.behavior.method(name, &self.downgrade())
    }
}

impl std::fmt::Debug for ShadowElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowElement")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("attributes", &*self.inner.attributes.read())
            .field("renders", &self.render_count())
            .finish()
    }
}

/// Non-owning reference to a [`ShadowElement`].
#[derive(Clone)]
pub struct WeakElement {
    inner: Weak<ElementInner>,
}

impl WeakElement {
    pub fn upgrade(&self) -> Option<ShadowElement> {
        self.inner.upgrade().map(|inner| ShadowElement { inner })
    }
}

impl std::fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakElement")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}
