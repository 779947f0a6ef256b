//! Elements
//!
//! Element instances and everything they share.
//!
//! # Overview
//!
//! - [`ShadowElement`]: one instance of a definition, driven through its
//!   lifecycle callbacks.
//! - [`Environment`]: the document and window event sources, the timer
//!   backend and the renderer that instances share.
//! - [`ElementRegistry`]: tag names to definitions.
//! - [`ButtonElement`]: an element with native-button keyboard and
//!   disabled-state behaviour.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shadow_element::element::{Environment, Markup, ShadowElement};
//! use shadow_element::reflect::ElementDefinition;
//!
//! let definition = ElementDefinition::builder()
//!     .string_prop("greeting", "hello")
//!     .build()?;
//!
//! let env = Environment::tokio();
//! let element = ShadowElement::new(
//!     definition,
//!     Arc::new(|el: &ShadowElement| -> shadow_element::Result<Markup> {
//!         Ok(Markup::new(format!("<p>{}</p>", el.get("greeting")?)))
//!     }),
//!     &env,
//! );
//!
//! element.connected_callback()?;
//! element.set("greeting", "hi")?; // renders again after the quiet period
//! ```

mod button;
mod environment;
mod registry;
mod render;
mod shadow;

pub use button::ButtonElement;
pub use environment::Environment;
pub use registry::{is_valid_element_name, ElementRegistry};
pub use render::{Markup, MarkupRenderer, Renderer, ShadowRoot};
pub use shadow::{ElementBehavior, ElementId, LifecycleState, ShadowElement, WeakElement};
