//! Element Registry
//!
//! Maps tag names to frozen definitions. A tag can be defined once; later
//! definitions under the same tag are rejected rather than replacing the
//! first.
//!
//! Tag names follow the custom element naming rules: they start with a
//! lowercase ASCII letter, contain a hyphen, contain no uppercase ASCII and
//! are not one of the names reserved by SVG and MathML.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::environment::Environment;
use super::shadow::{ElementBehavior, ShadowElement};
use crate::error::{Error, Result};
use crate::reflect::ElementDefinition;

const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Whether `tag` may name a custom element.
pub fn is_valid_element_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    let starts_lower = matches!(chars.next(), Some(c) if c.is_ascii_lowercase());

    starts_lower
        && tag.contains('-')
        && !tag.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace())
        && !RESERVED_NAMES.contains(&tag)
}

/// Tag name to definition. Shareable across threads.
#[derive(Debug, Default)]
pub struct ElementRegistry {
    definitions: DashMap<String, Arc<ElementDefinition>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `definition` under `tag`.
    pub fn define(&self, tag: &str, definition: Arc<ElementDefinition>) -> Result<Arc<ElementDefinition>> {
        if !is_valid_element_name(tag) {
            return Err(Error::InvalidElementName(tag.to_string()));
        }

        match self.definitions.entry(tag.to_string()) {
            Entry::Occupied(_) => Err(Error::AlreadyDefined(tag.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&definition));
                debug!(tag, properties = definition.properties().count(), "element defined");
                Ok(definition)
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<Arc<ElementDefinition>> {
        self.definitions.get(tag).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    /// Defined tags, in no particular order.
    pub fn tags(&self) -> Vec<String> {
        self.definitions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Construct an unattached instance of the element defined under `tag`.
    pub fn create(&self, tag: &str, behavior: Arc<dyn ElementBehavior>, env: &Environment) -> Result<ShadowElement> {
        let definition = self
            .get(tag)
            .ok_or_else(|| Error::NotDefined(tag.to_string()))?;
        Ok(ShadowElement::new(definition, behavior, env))
    }
}
