//! Property Descriptors
//!
//! A [`PropertyDescriptor`] describes one declared property of an element type:
//! its name, how it is stored, and its default value.
//!
//! # Storage
//!
//! - `String` and `Number` properties live in an attribute. Reading coerces the
//!   attribute text (or the default, when the attribute is absent) to the
//!   declared type. Writing [`PropValue::Null`] removes the attribute, anything
//!   else stores its string form.
//! - `Boolean` properties are presence-only. The attribute text is never read,
//!   and when present it is always the empty string.
//! - `Opaque` properties are plain in-memory values. They are not attribute
//!   backed; every assignment requests a render.
//!
//! Numeric text that does not parse yields `NaN`, not the default.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::name::AttributeName;

/// How a declared property is stored and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Opaque,
}

impl PropKind {
    /// Whether this kind mirrors an attribute.
    pub fn is_reflected(self) -> bool {
        !matches!(self, Self::Opaque)
    }
}

/// A property value as seen by element code.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PropValue {
    /// The absence marker. Assigning it to a reflected property removes the
    /// attribute.
    #[default]
    Null,
    String(String),
    Number(f64),
    Boolean(bool),
    Opaque(serde_json::Value),
}

impl PropValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness as used by boolean properties.
    ///
    /// Empty strings, zero, `NaN`, `false` and null are falsy. Opaque arrays
    /// and objects are always truthy, even when empty.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Boolean(b) => *b,
            Self::Opaque(value) => json_truthy(value),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Opaque(value) => Some(value),
            _ => None,
        }
    }

    /// The text stored in an attribute for this value, or `None` for null.
    pub fn to_attribute_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::String(s) => Some(s.clone()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Boolean(b) => Some(b.to_string()),
            Self::Opaque(serde_json::Value::Null) => None,
            Self::Opaque(serde_json::Value::String(s)) => Some(s.clone()),
            Self::Opaque(value) => Some(value.to_string()),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            other => f.write_str(&other.to_attribute_text().unwrap_or_default()),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Opaque(value)
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

fn json_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a number the way it is written into an attribute.
///
/// Integral values drop the fractional part (`50`, not `50.0`). Magnitudes
/// from `1e21` up and below `1e-6` use exponent form with a signed exponent
/// (`1e+21`, `1.5e-7`), as DOM attribute text does.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => text,
        }
    } else {
        n.to_string()
    }
}

/// Parse attribute text as a number.
///
/// Surrounding whitespace is ignored and blank text is zero. Anything that is
/// not a decimal literal (or `Infinity`) is `NaN`.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    // At most one sign
    let unsigned = trimmed
        .strip_prefix(|c| c == '+' || c == '-')
        .unwrap_or(trimmed);
    if unsigned == "Infinity" {
        return if trimmed.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    // Rust also accepts `inf` and `nan` spellings, which are not decimal literals
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return f64::NAN;
    }

    trimmed.parse().unwrap_or(f64::NAN)
}

/// What a reflected write does to the backing attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeWrite {
    Set(String),
    Remove,
}

/// A declared property of an element type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    name: String,
    kind: PropKind,
    default: PropValue,
    attribute: Option<AttributeName>,
}

impl PropertyDescriptor {
    /// A string-valued, attribute-backed property.
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::reflected(name.into(), PropKind::String, PropValue::String(default.into()))
    }

    /// A number-valued, attribute-backed property.
    pub fn number(name: impl Into<String>, default: f64) -> Self {
        Self::reflected(name.into(), PropKind::Number, PropValue::Number(default))
    }

    /// A presence-only boolean property. Its default is always `false`.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::reflected(name.into(), PropKind::Boolean, PropValue::Boolean(false))
    }

    /// An in-memory property whose assignment requests a render.
    pub fn opaque(name: impl Into<String>, initial: impl Into<PropValue>) -> Self {
        Self {
            name: name.into(),
            kind: PropKind::Opaque,
            default: initial.into(),
            attribute: None,
        }
    }

    fn reflected(name: String, kind: PropKind, default: PropValue) -> Self {
        let attribute = Some(AttributeName::from_property(&name));
        Self { name, kind, default, attribute }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropKind {
        self.kind
    }

    pub fn default_value(&self) -> &PropValue {
        &self.default
    }

    /// The attribute mirroring this property. `None` for opaque properties.
    pub fn attribute(&self) -> Option<&AttributeName> {
        self.attribute.as_ref()
    }

    /// Read the property from the current attribute text.
    ///
    /// Opaque properties are not attribute backed; for them this returns the
    /// declared initial value.
    pub fn read(&self, attribute: Option<&str>) -> PropValue {
        match self.kind {
            PropKind::Boolean => PropValue::Boolean(attribute.is_some()),
            PropKind::String => match attribute {
                Some(text) => PropValue::String(text.to_string()),
                None => PropValue::String(self.default.to_attribute_text().unwrap_or_default()),
            },
            PropKind::Number => match attribute {
                Some(text) => PropValue::Number(parse_number(text)),
                None => PropValue::Number(match &self.default {
                    PropValue::Number(n) => *n,
                    other => other.to_attribute_text().map_or(0.0, |t| parse_number(&t)),
                }),
            },
            PropKind::Opaque => self.default.clone(),
        }
    }

    /// Translate an assignment into an attribute mutation.
    ///
    /// Returns `None` for opaque properties, which have no attribute.
    pub fn write(&self, value: &PropValue) -> Option<AttributeWrite> {
        match self.kind {
            PropKind::Boolean => Some(if value.is_truthy() {
                AttributeWrite::Set(String::new())
            } else {
                AttributeWrite::Remove
            }),
            PropKind::String | PropKind::Number => Some(match value.to_attribute_text() {
                Some(text) => AttributeWrite::Set(text),
                None => AttributeWrite::Remove,
            }),
            PropKind::Opaque => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_reads_attribute_or_default() {
        let prop = PropertyDescriptor::string("stringProp", "String Prop");
        assert_eq!(prop.attribute().map(AttributeName::as_str), Some("string-prop"));

        assert_eq!(prop.read(None), PropValue::from("String Prop"));
        assert_eq!(prop.read(Some("new value")), PropValue::from("new value"));
        assert_eq!(prop.read(Some("")), PropValue::from(""));
    }

    #[test]
    fn number_reads_attribute_or_default() {
        let prop = PropertyDescriptor::number("numericProp", 5.0);

        assert_eq!(prop.read(None), PropValue::Number(5.0));
        assert_eq!(prop.read(Some("500")), PropValue::Number(500.0));
        assert_eq!(prop.read(Some(" 2.5 ")), PropValue::Number(2.5));
    }

    #[test]
    fn malformed_number_is_nan_not_default() {
        let prop = PropertyDescriptor::number("numericProp", 5.0);

        let value = prop.read(Some("five")).as_number().unwrap();
        assert!(value.is_nan());

        assert!(parse_number("12px").is_nan());
        assert!(parse_number("nan").is_nan());
        assert!(parse_number("inf").is_nan());
    }

    #[test]
    fn number_parsing_edge_cases() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("   "), 0.0);
        assert_eq!(parse_number("-3"), -3.0);
        assert_eq!(parse_number(".5"), 0.5);
        assert_eq!(parse_number("1e3"), 1000.0);
        assert_eq!(parse_number("Infinity"), f64::INFINITY);
        assert_eq!(parse_number("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(parse_number("+Infinity"), f64::INFINITY);
    }

    #[test]
    fn repeated_signs_are_nan() {
        assert!(parse_number("--Infinity").is_nan());
        assert!(parse_number("+-Infinity").is_nan());
        assert!(parse_number("-+5").is_nan());
        assert!(parse_number("--5").is_nan());
    }

    #[test]
    fn numbers_format_without_trailing_fraction() {
        assert_eq!(format_number(50.0), "50");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn extreme_magnitudes_use_exponent_form() {
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-1.5e25), "-1.5e+25");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");

        // Exponent form reads back
        assert_eq!(parse_number(&format_number(1e21)), 1e21);
        assert_eq!(parse_number(&format_number(1.5e-7)), 1.5e-7);
    }

    #[test]
    fn typed_write_sets_or_removes() {
        let prop = PropertyDescriptor::number("numericProp", 5.0);

        assert_eq!(prop.write(&PropValue::from(50)), Some(AttributeWrite::Set("50".into())));
        assert_eq!(prop.write(&PropValue::Null), Some(AttributeWrite::Remove));
        assert_eq!(prop.write(&PropValue::from(None::<f64>)), Some(AttributeWrite::Remove));

        let prop = PropertyDescriptor::string("stringProp", "");
        assert_eq!(prop.write(&PropValue::from(true)), Some(AttributeWrite::Set("true".into())));
        assert_eq!(prop.write(&PropValue::Opaque(json!(null))), Some(AttributeWrite::Remove));
    }

    #[test]
    fn boolean_is_presence_only() {
        let prop = PropertyDescriptor::boolean("booleanProp");

        assert_eq!(prop.read(None), PropValue::Boolean(false));
        assert_eq!(prop.read(Some("")), PropValue::Boolean(true));
        assert_eq!(prop.read(Some("false")), PropValue::Boolean(true));

        assert_eq!(prop.write(&PropValue::from(true)), Some(AttributeWrite::Set(String::new())));
        assert_eq!(prop.write(&PropValue::from(false)), Some(AttributeWrite::Remove));
        assert_eq!(prop.write(&PropValue::Null), Some(AttributeWrite::Remove));
        assert_eq!(prop.write(&PropValue::from("yes")), Some(AttributeWrite::Set(String::new())));
        assert_eq!(prop.write(&PropValue::from(0)), Some(AttributeWrite::Remove));
    }

    #[test]
    fn opaque_has_no_attribute() {
        let prop = PropertyDescriptor::opaque("prop2", json!([1, 2]));

        assert!(prop.attribute().is_none());
        assert!(!prop.kind().is_reflected());
        assert_eq!(prop.write(&PropValue::from("x")), None);
        assert_eq!(prop.read(None), PropValue::Opaque(json!([1, 2])));
    }

    #[test]
    fn truthiness() {
        assert!(!PropValue::Null.is_truthy());
        assert!(!PropValue::from("").is_truthy());
        assert!(!PropValue::Number(f64::NAN).is_truthy());
        assert!(PropValue::Opaque(json!([])).is_truthy());
        assert!(!PropValue::Opaque(json!(0)).is_truthy());
        assert!(PropValue::from("0").is_truthy());
    }
}
