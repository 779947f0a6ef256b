//! Hosting Environment
//!
//! The collaborators every element instance shares: the global event sources,
//! the timer backend and the renderer.

use std::sync::Arc;

use crate::element::render::{MarkupRenderer, Renderer};
use crate::events::{EventSource, EventTarget};
use crate::schedule::{Scheduler, TokioScheduler};

/// Shared collaborators for elements. Cloning is cheap.
#[derive(Clone)]
pub struct Environment {
    document: EventTarget,
    window: EventTarget,
    scheduler: Arc<dyn Scheduler>,
    renderer: Arc<dyn Renderer>,
}

impl Environment {
    /// An environment on `scheduler` with the bundled [`MarkupRenderer`].
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            document: EventTarget::new("document"),
            window: EventTarget::new("window"),
            scheduler,
            renderer: Arc::new(MarkupRenderer),
        }
    }

    /// An environment whose timers run on the current tokio runtime.
    pub fn tokio() -> Self {
        Self::new(Arc::new(TokioScheduler::current()))
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn document(&self) -> &EventTarget {
        &self.document
    }

    pub fn window(&self) -> &EventTarget {
        &self.window
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    /// The global target for `source`. `Host` has no global target.
    pub fn global_target(&self, source: EventSource) -> Option<&EventTarget> {
        match source {
            EventSource::Document => Some(&self.document),
            EventSource::Window => Some(&self.window),
            EventSource::Host => None,
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("document", &self.document)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
