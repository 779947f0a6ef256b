//! Property Name Encoding
//!
//! Converts property-style identifiers (`stringProp`) into the attribute-style
//! identifiers the DOM uses (`string-prop`).
//!
//! # Rules
//!
//! A hyphen is inserted before an uppercase letter when:
//!
//! 1. the previous character is a lowercase letter or a digit (`stringProp`), or
//! 2. the previous character is uppercase and the next one is a lowercase
//!    letter, which splits an acronym from the word that follows it
//!    (`URLValue` becomes `url-value`).
//!
//! Everything is then lowercased. Boundaries are only found between ASCII
//! letters and digits, so where hyphens go never depends on Unicode case
//! tables; lowercasing itself covers every script. Strings that are already
//! lowercase and hyphenated pass through untouched.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Encode a property name as an attribute name.
pub fn decamelize(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();

            let after_word = prev.is_ascii_lowercase() || prev.is_ascii_digit();
            let ends_acronym = prev.is_ascii_uppercase()
                && next.is_some_and(|n| n.is_ascii_lowercase());

            if after_word || ends_acronym {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

/// An attribute name derived from a property name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeName(String);

impl AttributeName {
    /// Encode a property name.
    pub fn from_property(name: &str) -> Self {
        Self(decamelize(name))
    }

    /// Use `name` verbatim, lowercased. Attribute names are case-insensitive
    /// in HTML documents.
    pub fn verbatim(name: &str) -> Self {
        Self(name.to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AttributeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for AttributeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_case() {
        assert_eq!(decamelize("stringProp"), "string-prop");
        assert_eq!(decamelize("numericProp"), "numeric-prop");
        assert_eq!(decamelize("booleanProp"), "boolean-prop");
        assert_eq!(decamelize("aLongerPropertyName"), "a-longer-property-name");
    }

    #[test]
    fn splits_after_digits() {
        assert_eq!(decamelize("prop2Value"), "prop2-value");
        assert_eq!(decamelize("h1Title"), "h1-title");
    }

    #[test]
    fn separates_acronym_from_following_word() {
        assert_eq!(decamelize("URLValue"), "url-value");
        assert_eq!(decamelize("XMLHttpRequest"), "xml-http-request");
        assert_eq!(decamelize("innerHTML"), "inner-html");
        assert_eq!(decamelize("UTF8"), "utf8");
    }

    #[test]
    fn single_words_are_only_lowercased() {
        assert_eq!(decamelize("value"), "value");
        assert_eq!(decamelize("Value"), "value");
        assert_eq!(decamelize("URL"), "url");
        assert_eq!(decamelize(""), "");
    }

    #[test]
    fn already_encoded_names_are_unchanged() {
        for name in ["string-prop", "url-value", "a", "data-x2"] {
            assert_eq!(decamelize(name), name);
            assert_eq!(decamelize(&decamelize(name)), name);
        }
    }

    #[test]
    fn non_ascii_is_lowercased_without_new_boundaries() {
        assert_eq!(decamelize("naïveTest"), "naïve-test");
        // `é` is not ASCII lowercase, so it does not start a boundary
        assert_eq!(decamelize("caféOlé"), "caféolé");
        assert_eq!(decamelize("ÄpfelBaum"), "äpfel-baum");
        assert_eq!(decamelize("ÉCOLE"), "école");
    }

    #[test]
    fn attribute_name_wraps_encoding() {
        let name = AttributeName::from_property("booleanProp");
        assert_eq!(name.as_str(), "boolean-prop");
        assert_eq!(name.to_string(), "boolean-prop");

        assert_eq!(AttributeName::verbatim("Aria-Label").as_str(), "aria-label");
    }
}
