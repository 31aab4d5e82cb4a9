//! Error handling for the swaggen code generation library.
//!
//! This module defines the main error type `Error` used throughout the library,
//! along with a convenient `Result` type alias. Fatal conditions (I/O, network,
//! template rendering, contradictory configuration) surface as `Error`.
//!
//! Problems with individual entries of a specification document never abort a
//! run. They are reported as [`Warning`]s, logged when raised and collected
//! next to the stage output that produced them.
//!
//! # Examples
//!
//! ```
//! use swaggen_core::error::{Error, Result};
//!
//! fn might_fail() -> Result<()> {
//!     Err(Error::config("output directory is required"))
//! }
//! assert!(might_fail().is_err());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for swaggen generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for swaggen generation operations
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error while fetching a specification document
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// OpenAPI error
    #[error("OpenAPI error: {0}")]
    OpenApi(String),

    /// Template error
    #[error("Template error: {0}")]
    Template(String),

    /// Template engine error
    #[error("Template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new OpenAPI error
    pub fn openapi<S: Into<String>>(msg: S) -> Self {
        Self::OpenApi(msg.into())
    }

    /// Create a new template error
    pub fn template<S: Into<String>>(msg: S) -> Self {
        Self::Template(msg.into())
    }
}

/// Non-fatal diagnostic raised while translating a specification document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A declared type or operation is missing a sub-structure it should have.
    /// A safe default was substituted.
    MalformedInput {
        /// Where the problem was found, e.g. `Widget.label` or `GET /widgets`
        location: String,
        /// What was wrong
        detail: String,
    },
    /// A `$ref` names a type that is not declared in the document.
    UnresolvableReference {
        /// Where the reference was found
        location: String,
        /// The referenced type name
        name: String,
    },
    /// The domain closure pass stopped with names still uncategorized.
    DomainResolutionExhausted {
        /// Names left in the sentinel domain
        names: Vec<String>,
    },
}

impl Warning {
    /// Build a [`Warning::MalformedInput`] and log it.
    pub fn malformed(location: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            location: location.into(),
            detail: detail.into(),
        }
        .logged()
    }

    /// Build a [`Warning::UnresolvableReference`] and log it.
    pub fn unresolvable(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnresolvableReference {
            location: location.into(),
            name: name.into(),
        }
        .logged()
    }

    /// Build a [`Warning::DomainResolutionExhausted`] and log it.
    pub fn exhausted(names: Vec<String>) -> Self {
        Self::DomainResolutionExhausted { names }.logged()
    }

    fn logged(self) -> Self {
        log::warn!("{}", self);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput { location, detail } => {
                write!(f, "malformed input at {}: {}", location, detail)
            }
            Self::UnresolvableReference { location, name } => {
                write!(f, "unresolvable reference '{}' at {}", name, location)
            }
            Self::DomainResolutionExhausted { names } => write!(
                f,
                "{} schemas remain uncategorized: {}",
                names.len(),
                names.join(", ")
            ),
        }
    }
}
