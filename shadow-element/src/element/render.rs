//! Render Target
//!
//! Rendering is delegated to a [`Renderer`]: it receives the mount point (the
//! element's [`ShadowRoot`]) and a template producer that it may call lazily.
//! Diffing is the renderer's business. The bundled [`MarkupRenderer`] only
//! commits when the produced markup differs from what is mounted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::trace;

use crate::error::Result;
use crate::reflect::ShadowRootMode;

/// A template's output.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Markup(String);

impl Markup {
    pub fn new(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for Markup {
    fn from(markup: String) -> Self {
        Self(markup)
    }
}

impl From<&str> for Markup {
    fn from(markup: &str) -> Self {
        Self(markup.to_string())
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The isolated subtree an element renders into.
pub struct ShadowRoot {
    mode: ShadowRootMode,
    adopted_styles: Vec<String>,
    content: RwLock<Option<Markup>>,
    commits: AtomicU64,
}

impl ShadowRoot {
    pub fn new(mode: ShadowRootMode, adopted_styles: Vec<String>) -> Self {
        Self {
            mode,
            adopted_styles,
            content: RwLock::new(None),
            commits: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> ShadowRootMode {
        self.mode
    }

    /// Stylesheets applied to this root, parent definitions first.
    pub fn adopted_styles(&self) -> &[String] {
        &self.adopted_styles
    }

    /// The mounted markup, if anything was rendered yet.
    pub fn content(&self) -> Option<Markup> {
        self.content.read().clone()
    }

    /// The mounted markup as text; empty before the first render.
    pub fn text_content(&self) -> String {
        self.content
            .read()
            .as_ref()
            .map(|markup| markup.as_str().to_string())
            .unwrap_or_default()
    }

    /// Replace the mounted markup. Returns `false`, leaving the root
    /// untouched, if it is unchanged.
    pub fn commit(&self, markup: Markup) -> bool {
        let mut content = self.content.write();
        if content.as_ref() == Some(&markup) {
            return false;
        }
        *content = Some(markup);
        self.commits.fetch_add(1, Ordering::Relaxed);
        true
    }

    /// Number of commits that changed the mounted markup.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for ShadowRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowRoot")
            .field("mode", &self.mode)
            .field("adopted_styles", &self.adopted_styles.len())
            .field("commits", &self.commit_count())
            .finish()
    }
}

/// Turns a template into mounted content.
pub trait Renderer: Send + Sync {
    /// Render into `root`. `template` produces the current markup and may be
    /// called any number of times, including zero.
    fn render(&self, root: &ShadowRoot, template: &dyn Fn() -> Result<Markup>) -> Result<()>;
}

/// Commits the template's markup when it changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupRenderer;

impl Renderer for MarkupRenderer {
    fn render(&self, root: &ShadowRoot, template: &dyn Fn() -> Result<Markup>) -> Result<()> {
        let markup = template()?;
        let changed = root.commit(markup);
        trace!(changed, "markup rendered");
        Ok(())
    }
}
