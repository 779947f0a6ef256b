//! Property Reflection
//!
//! Declarations that map element properties onto DOM attributes.
//!
//! # Concepts
//!
//! ## Reflected properties
//!
//! String, number and boolean properties are stored in an attribute whose
//! name is the hyphenated form of the property name. Reading the property
//! reads the attribute; assigning it writes the attribute, which in turn
//! requests a debounced render because the attribute is observed.
//!
//! ## Render properties
//!
//! Opaque properties live in memory only. Every assignment requests a
//! debounced render directly.
//!
//! ## Definitions
//!
//! An element type's declaration is collected once by a [`DefinitionBuilder`]
//! and frozen into an [`ElementDefinition`] shared by every instance.

mod definition;
mod name;
mod property;

pub use definition::{DefinitionBuilder, DetachPolicy, ElementDefinition, ElementOptions, ShadowRootMode};
pub use name::{decamelize, AttributeName};
pub use property::{format_number, parse_number, AttributeWrite, PropKind, PropValue, PropertyDescriptor};
