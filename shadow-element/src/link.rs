//! Module-relative Links
//!
//! Resolves a reference against the URL of the module that makes it, the
//! way a component bundles assets next to its own source.

use url::Url;

use crate::error::Result;

/// Resolve `reference` against `base`.
///
/// ```
/// use shadow_element::link::meta_link;
///
/// let link = meta_link("../index.html", "http://localhost/test/test.html").unwrap();
/// assert_eq!(link, "http://localhost/index.html");
/// ```
pub fn meta_link(reference: &str, base: &str) -> Result<String> {
    let base = Url::parse(base)?;
    Ok(base.join(reference)?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const BASE: &str = "http://localhost/test/test.html";

    #[test]
    fn resolves_sibling_and_parent() {
        assert_eq!(meta_link("page.html", BASE).unwrap(), "http://localhost/test/page.html");
        assert_eq!(meta_link("./page.html", BASE).unwrap(), "http://localhost/test/page.html");
        assert_eq!(meta_link("../index.html", BASE).unwrap(), "http://localhost/index.html");
    }

    #[test]
    fn absolute_reference_wins() {
        assert_eq!(
            meta_link("https://example.com/a.css", BASE).unwrap(),
            "https://example.com/a.css"
        );
        assert_eq!(meta_link("/root.css", BASE).unwrap(), "http://localhost/root.css");
    }

    #[test]
    fn relative_base_is_rejected() {
        let err = meta_link("page.html", "test/test.html").unwrap_err();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
