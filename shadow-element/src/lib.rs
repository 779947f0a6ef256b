//! Shadow Element
//!
//! This crate provides the runtime behind custom elements that render into a
//! shadow root. It implements:
//!
//! - Attribute-reflected properties (string, number, boolean) and in-memory
//!   render properties
//! - Debounced re-rendering with a forced ceiling
//! - Lifecycle listeners on the document, the window and the element itself,
//!   bound while the element is attached
//! - A registry of element definitions by tag name
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reflect`: Property declarations, hyphenated attribute names and frozen
//!   element definitions
//! - `events`: Event targets and the lifecycle listener binder
//! - `schedule`: Timer backends and the debouncer
//! - `element`: Element instances, their environment and the registry
//! - `link`: Module-relative URL resolution
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shadow_element::element::{Environment, Markup, ShadowElement};
//! use shadow_element::events::{EventSource, Handler};
//! use shadow_element::reflect::ElementDefinition;
//!
//! // Declare the element type once
//! let definition = ElementDefinition::builder()
//!     .numeric_prop("count", 0.0)
//!     .on(EventSource::Document, "click", Handler::method("increment"))
//!     .build()?;
//!
//! // Create an instance and attach it
//! let element = ShadowElement::new(definition, behavior, &Environment::tokio());
//! element.connected_callback()?; // renders immediately
//!
//! // Update a property
//! element.set("count", 5)?;
//! // A render follows once the quiet period elapses
//! ```

pub mod element;
pub mod error;
pub mod events;
pub mod link;
pub mod reflect;
pub mod schedule;

pub use error::{Error, Result};
