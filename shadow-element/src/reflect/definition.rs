//! Element Definitions
//!
//! An [`ElementDefinition`] is everything an element type declares once at
//! registration: its properties, the attributes it observes, its lifecycle
//! listeners, its stylesheets and its timings. It is built by a
//! [`DefinitionBuilder`], frozen behind an `Arc`, and shared by every instance.
//!
//! # Inheritance
//!
//! A definition may extend a parent definition. The merge happens once, in
//! [`DefinitionBuilder::build`]:
//!
//! - parent properties come first; a child may redeclare one to shadow it
//! - observed attributes are recomputed from the merged properties, plus
//!   the extra attributes either declaration observes
//! - lifecycle listeners are layered, the child winning on the same source
//!   and event type
//! - stylesheets are concatenated, parent first
//!
//! Within a single declaration every property name must be unique.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::name::AttributeName;
use super::property::{PropertyDescriptor, PropValue};
use crate::error::{Error, Result};
use crate::events::{EventSource, Handler, LifecycleEventMap};
use crate::schedule::DebounceConfig;

/// Whether the shadow root is reachable from outside the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

/// What happens to a pending debounced render when an element detaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetachPolicy {
    /// Drop the pending render. The next attach renders immediately anyway.
    #[default]
    CancelPending,
    /// Let the pending render fire against the detached element.
    LetPendingFire,
}

/// Declaration options in their serialized form.
///
/// Every category is optional and unknown keys are ignored:
///
/// ```json
/// {
///   "stringProps": { "stringProp": "String Prop" },
///   "numericProps": { "numericProp": 5 },
///   "booleanProps": ["booleanProp"],
///   "renderProps": { "items": [1, 2] },
///   "lifecycleEvents": { "document": { "click": "onDocumentClick" } }
/// }
/// ```
///
/// `documentEvents` and `windowEvents` are shorthands for the `document` and
/// `window` entries of `lifecycleEvents`. Where both name the same event type
/// the shorthand wins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementOptions {
    pub string_props: IndexMap<String, String>,
    pub numeric_props: IndexMap<String, f64>,
    pub boolean_props: Vec<String>,
    pub render_props: IndexMap<String, serde_json::Value>,
    /// Attributes observed without a reflected property.
    pub observed_attributes: Vec<String>,
    pub lifecycle_events: LifecycleEventMap,
    pub document_events: IndexMap<String, Handler>,
    pub window_events: IndexMap<String, Handler>,
    pub styles: Vec<String>,
    pub shadow_mode: Option<ShadowRootMode>,
    pub debounce: Option<DebounceConfig>,
    pub detach_policy: Option<DetachPolicy>,
}

impl ElementOptions {
    /// Parse options from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Accumulates a declaration. Append-only until [`build`](Self::build).
#[derive(Debug, Default)]
pub struct DefinitionBuilder {
    parent: Option<Arc<ElementDefinition>>,
    properties: IndexMap<String, PropertyDescriptor>,
    extra_observed: Vec<AttributeName>,
    events: LifecycleEventMap,
    styles: Vec<String>,
    shadow_mode: Option<ShadowRootMode>,
    debounce: Option<DebounceConfig>,
    detach_policy: Option<DetachPolicy>,
    duplicate: Option<String>,
}

impl DefinitionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from serialized options.
    pub fn from_options(options: ElementOptions) -> Self {
        let mut builder = Self::new();

        for (name, value) in options.render_props {
            builder = builder.render_prop(name, value);
        }
        for (name, default) in options.string_props {
            builder = builder.string_prop(name, default);
        }
        for (name, default) in options.numeric_props {
            builder = builder.numeric_prop(name, default);
        }
        for name in options.boolean_props {
            builder = builder.boolean_prop(name);
        }
        for name in &options.observed_attributes {
            builder = builder.observe(name);
        }

        builder.events = options.lifecycle_events;
        for (event_type, handler) in options.document_events {
            builder.events.on(EventSource::Document, event_type, handler);
        }
        for (event_type, handler) in options.window_events {
            builder.events.on(EventSource::Window, event_type, handler);
        }
        builder.styles = options.styles;
        builder.shadow_mode = options.shadow_mode;
        builder.debounce = options.debounce;
        builder.detach_policy = options.detach_policy;
        builder
    }

    /// Inherit from `parent`.
    pub fn extends(mut self, parent: &Arc<ElementDefinition>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn string_prop(self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::string(name, default))
    }

    pub fn numeric_prop(self, name: impl Into<String>, default: f64) -> Self {
        self.property(PropertyDescriptor::number(name, default))
    }

    pub fn boolean_prop(self, name: impl Into<String>) -> Self {
        self.property(PropertyDescriptor::boolean(name))
    }

    pub fn render_prop(self, name: impl Into<String>, initial: impl Into<PropValue>) -> Self {
        self.property(PropertyDescriptor::opaque(name, initial))
    }

    /// Declare a property. Declaring a name twice fails the build.
    pub fn property(mut self, descriptor: PropertyDescriptor) -> Self {
        let name = descriptor.name().to_string();
        if self.properties.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.properties.insert(name, descriptor);
        }
        self
    }

    /// Observe an attribute that has no reflected property.
    pub fn observe(mut self, attribute: &str) -> Self {
        self.extra_observed.push(AttributeName::verbatim(attribute));
        self
    }

    /// Declare a lifecycle listener.
    pub fn on(mut self, source: EventSource, event_type: impl Into<String>, handler: Handler) -> Self {
        self.events.on(source, event_type, handler);
        self
    }

    /// Add a stylesheet adopted by each instance's shadow root.
    pub fn style(mut self, css: impl Into<String>) -> Self {
        self.styles.push(css.into());
        self
    }

    pub fn shadow_mode(mut self, mode: ShadowRootMode) -> Self {
        self.shadow_mode = Some(mode);
        self
    }

    pub fn debounce(mut self, config: DebounceConfig) -> Self {
        self.debounce = Some(config);
        self
    }

    pub fn detach_policy(mut self, policy: DetachPolicy) -> Self {
        self.detach_policy = Some(policy);
        self
    }

    /// Freeze the declaration.
    pub fn build(self) -> Result<Arc<ElementDefinition>> {
        if let Some(name) = self.duplicate {
            return Err(Error::DuplicateProperty(name));
        }

        let parent = self.parent.as_deref();

        let mut properties = parent.map(|p| p.properties.clone()).unwrap_or_default();
        properties.extend(self.properties);

        let mut extra_observed = parent.map(|p| p.extra_observed.clone()).unwrap_or_default();
        extra_observed.extend(self.extra_observed);

        // From the merged properties, so a shadowed parent property no longer
        // contributes its attribute
        let mut observed: IndexSet<AttributeName> = properties
            .values()
            .filter_map(|descriptor| descriptor.attribute().cloned())
            .collect();
        observed.extend(extra_observed.iter().cloned());

        let lifecycle_events = match parent {
            Some(parent) => LifecycleEventMap::merged(&parent.lifecycle_events, &self.events),
            None => self.events,
        };

        let mut styles = parent.map(|p| p.styles.clone()).unwrap_or_default();
        styles.extend(self.styles);

        let definition = ElementDefinition {
            properties,
            observed,
            extra_observed,
            lifecycle_events,
            styles,
            shadow_mode: self
                .shadow_mode
                .or(parent.map(|p| p.shadow_mode))
                .unwrap_or_default(),
            debounce: self
                .debounce
                .or(parent.map(|p| p.debounce))
                .unwrap_or_default(),
            detach_policy: self
                .detach_policy
                .or(parent.map(|p| p.detach_policy))
                .unwrap_or_default(),
        };

        debug!(
            properties = definition.properties.len(),
            observed = definition.observed.len(),
            lifecycle_events = definition.lifecycle_events.len(),
            "element definition built"
        );
        Ok(Arc::new(definition))
    }
}

/// A frozen element type declaration.
#[derive(Debug)]
pub struct ElementDefinition {
    properties: IndexMap<String, PropertyDescriptor>,
    observed: IndexSet<AttributeName>,
    /// Attributes observed without a property, inherited by children.
    extra_observed: IndexSet<AttributeName>,
    lifecycle_events: LifecycleEventMap,
    styles: Vec<String>,
    shadow_mode: ShadowRootMode,
    debounce: DebounceConfig,
    detach_policy: DetachPolicy,
}

impl ElementDefinition {
    pub fn builder() -> DefinitionBuilder {
        DefinitionBuilder::new()
    }

    /// Build a definition straight from serialized options.
    pub fn from_options(options: ElementOptions) -> Result<Arc<Self>> {
        DefinitionBuilder::from_options(options).build()
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.properties.values()
    }

    /// Attributes whose mutation requests a render, in declaration order.
    pub fn observed_attributes(&self) -> impl Iterator<Item = &str> {
        self.observed.iter().map(AttributeName::as_str)
    }

    pub fn is_observed(&self, attribute: &str) -> bool {
        self.observed.contains(attribute)
    }

    pub fn lifecycle_events(&self) -> &LifecycleEventMap {
        &self.lifecycle_events
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn shadow_mode(&self) -> ShadowRootMode {
        self.shadow_mode
    }

    pub fn debounce(&self) -> DebounceConfig {
        self.debounce
    }

    pub fn detach_policy(&self) -> DetachPolicy {
        self.detach_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::PropKind;
    use crate::schedule::MaxDelay;
    use std::collections::HashSet;

    #[test]
    fn observed_set_covers_reflected_properties() {
        let definition = ElementDefinition::builder()
            .string_prop("a", "")
            .boolean_prop("b")
            .build()
            .unwrap();

        let observed: HashSet<_> = definition.observed_attributes().collect();
        assert_eq!(observed, HashSet::from(["a", "b"]));
    }

    #[test]
    fn render_props_are_not_observed() {
        let definition = ElementDefinition::builder()
            .render_prop("items", serde_json::json!([1, 2]))
            .string_prop("stringProp", "x")
            .build()
            .unwrap();

        let observed: Vec<_> = definition.observed_attributes().collect();
        assert_eq!(observed, vec!["string-prop"]);
        assert_eq!(definition.property("items").unwrap().kind(), PropKind::Opaque);
    }

    #[test]
    fn duplicate_property_fails_build() {
        let err = ElementDefinition::builder()
            .string_prop("value", "")
            .numeric_prop("value", 1.0)
            .build()
            .unwrap_err();

        assert!(matches!(err, Error::DuplicateProperty(name) if name == "value"));
    }

    #[test]
    fn shared_attribute_name_is_observed_once() {
        let definition = ElementDefinition::builder()
            .string_prop("fooBar", "")
            .observe("foo-bar")
            .observe("FOO-BAR")
            .build()
            .unwrap();

        assert_eq!(definition.observed_attributes().count(), 1);
        assert!(definition.is_observed("foo-bar"));
    }

    #[test]
    fn options_deserialize_and_ignore_unknown_keys() {
        let options = ElementOptions::from_json(
            r#"{
                "stringProps": { "stringProp": "String Prop" },
                "numericProps": { "numericProp": 5 },
                "booleanProps": ["booleanProp"],
                "renderProps": { "prop1": "property 1", "prop2": [1, 2] },
                "lifecycleEvents": { "window": { "click": "onWindowClick" } },
                "shadowMode": "closed",
                "somethingElse": true
            }"#,
        )
        .unwrap();

        let definition = ElementDefinition::from_options(options).unwrap();

        let observed: Vec<_> = definition.observed_attributes().collect();
        assert_eq!(observed, vec!["string-prop", "numeric-prop", "boolean-prop"]);
        assert_eq!(definition.properties().count(), 5);
        assert_eq!(definition.lifecycle_events().len(), 1);
        assert_eq!(definition.shadow_mode(), ShadowRootMode::Closed);
        assert_eq!(definition.debounce(), DebounceConfig::default());
        assert_eq!(definition.detach_policy(), DetachPolicy::CancelPending);
    }

    #[test]
    fn document_and_window_event_shorthands() {
        let options = ElementOptions::from_json(
            r#"{
                "documentEvents": { "click": "onDocumentClick" },
                "windowEvents": { "resize": "onResize", "click": "onWindowClick" },
                "lifecycleEvents": {
                    "document": { "click": "replaced", "keydown": "onKeyDown" },
                    "host": { "keypress": "onKeyPress" }
                }
            }"#,
        )
        .unwrap();
        let definition = ElementDefinition::from_options(options).unwrap();
        let events = definition.lifecycle_events();
        assert_eq!(events.len(), 5);

        let document = events.events(EventSource::Document).unwrap();
        assert!(matches!(&document["click"], Handler::Method(name) if name == "onDocumentClick"));
        assert!(matches!(&document["keydown"], Handler::Method(name) if name == "onKeyDown"));

        let window = events.events(EventSource::Window).unwrap();
        let types: Vec<_> = window.keys().map(String::as_str).collect();
        assert_eq!(types, vec!["resize", "click"]);
    }

    #[test]
    fn shadowing_with_render_prop_drops_parent_attribute() {
        let parent = ElementDefinition::builder()
            .string_prop("label", "")
            .boolean_prop("open")
            .observe("data-theme")
            .build()
            .unwrap();
        let child = ElementDefinition::builder()
            .extends(&parent)
            .render_prop("label", PropValue::Null)
            .build()
            .unwrap();

        let observed: Vec<_> = child.observed_attributes().collect();
        assert_eq!(observed, vec!["open", "data-theme"]);
        assert!(!child.is_observed("label"));
        assert!(parent.is_observed("label"));

        // Extra observed attributes are inherited through a second level
        let grandchild = ElementDefinition::builder().extends(&child).build().unwrap();
        assert!(grandchild.is_observed("data-theme"));
    }

    #[test]
    fn empty_options_are_valid() {
        let definition = ElementDefinition::from_options(ElementOptions::from_json("{}").unwrap()).unwrap();

        assert_eq!(definition.properties().count(), 0);
        assert_eq!(definition.observed_attributes().count(), 0);
        assert!(definition.lifecycle_events().is_empty());
    }

    #[test]
    fn child_merges_parent_declaration() {
        let parent = ElementDefinition::builder()
            .string_prop("label", "parent")
            .boolean_prop("disabled")
            .style(":host { display: block }")
            .on(EventSource::Document, "click", Handler::method("onClick"))
            .debounce(DebounceConfig::new(20, MaxDelay::Multiple(2)))
            .build()
            .unwrap();

        let child = ElementDefinition::builder()
            .extends(&parent)
            .string_prop("label", "child")
            .numeric_prop("count", 0.0)
            .style(":host { color: red }")
            .on(EventSource::Window, "resize", Handler::method("onResize"))
            .build()
            .unwrap();

        let label = child.property("label").unwrap();
        assert_eq!(label.default_value(), &PropValue::from("child"));

        let observed: Vec<_> = child.observed_attributes().collect();
        assert_eq!(observed, vec!["label", "disabled", "count"]);

        assert_eq!(child.styles(), [":host { display: block }", ":host { color: red }"]);
        assert_eq!(child.lifecycle_events().len(), 2);
        assert_eq!(child.debounce().delay_ms, 20);

        // The parent is left untouched
        assert_eq!(parent.properties().count(), 2);
        assert_eq!(parent.styles().len(), 1);
    }
}
