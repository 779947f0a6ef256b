//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`]. Errors raised by
//! element authors (listeners, templates) travel through the same type so they
//! reach the call site that triggered them without being wrapped again.

use thiserror::Error;

/// Errors produced while declaring, registering, or driving an element.
#[derive(Debug, Error)]
pub enum Error {
    /// The same property name appears twice in one declaration.
    #[error("property `{0}` is declared more than once")]
    DuplicateProperty(String),

    /// A property was read or assigned that the definition does not declare.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// The tag name is not a valid custom element name.
    #[error("`{0}` is not a valid custom element name")]
    InvalidElementName(String),

    /// A definition is already registered under this tag name.
    #[error("custom element `{0}` is already defined")]
    AlreadyDefined(String),

    /// No definition is registered under this tag name.
    #[error("custom element `{0}` is not defined")]
    NotDefined(String),

    /// A method-name handler could not be resolved against the instance.
    #[error("element has no method `{0}` to bind")]
    UnresolvedMethod(String),

    /// An event listener failed.
    #[error("event handler failed: {0}")]
    Handler(String),

    /// The template producer or the renderer failed.
    #[error("render failed: {0}")]
    Render(String),

    /// URL resolution failed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Build a handler error from anything printable.
    pub fn handler(message: impl std::fmt::Display) -> Self {
        Self::Handler(message.to_string())
    }

    /// Build a render error from anything printable.
    pub fn render(message: impl std::fmt::Display) -> Self {
        Self::Render(message.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
