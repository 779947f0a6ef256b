//! Events
//!
//! Event targets and the binder that attaches an element type's declared
//! lifecycle listeners while an instance is attached.

mod binder;
mod target;

pub use binder::{Cleanup, EventBinder, EventSource, Handler, LifecycleEventMap, MethodResolver, NoMethods};
pub use target::{Event, EventTarget, Listener, ListenerId};
