//! Error types for settings loading and document manipulation.

use thiserror::Error;

/// Errors that can occur while loading or manipulating settings documents.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SettingsError {
    /// No resolver is registered for the locator's scheme.
    #[error("no resolver registered for scheme '{scheme}'")]
    UnknownScheme {
        /// Scheme that had no registered resolver.
        scheme: String,
    },

    /// A single candidate location could not be resolved.
    ///
    /// Recoverable inside a first-candidate-wins load; fatal everywhere else.
    #[error("could not resolve '{locator}'")]
    NotFound {
        /// Locator that failed to resolve.
        locator: String,
    },

    /// Every candidate location failed to resolve.
    #[error("no candidate could be loaded, tried: {}", attempted.join(", "))]
    NoCandidate {
        /// Every locator that was attempted, in order.
        attempted: Vec<String>,
    },

    /// A required top-level section is absent from the loaded document.
    #[error("missing section '{section}'")]
    MissingKey {
        /// Name of the absent section.
        section: String,
    },

    /// A key lookup on a [`Document`](crate::Document) found nothing.
    ///
    /// Kept distinct from other lookup failures so callers and tooling can
    /// treat "no such setting" specially.
    #[error("unknown attribute '{key}'")]
    UnknownAttribute {
        /// Key that was requested.
        key: String,
    },

    /// A required configuration path is still null after merging.
    #[error("required setting '{path}' is not set")]
    Validation {
        /// Full dotted path of the offending value.
        path: String,
    },

    /// The document text is not valid YAML, or is not shaped as required.
    #[error("malformed document: {message}")]
    Malformed {
        /// Parser or structural failure description.
        message: String,
    },

    /// An I/O failure while reading a local file.
    #[error("i/o error on '{path}': {source}")]
    Io {
        /// Path that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for fallible operations in this crate.
pub type SettingsResult<T> = Result<T, SettingsError>;

impl From<yaml_rust2::ScanError> for SettingsError {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Self::Malformed {
            message: err.to_string(),
        }
    }
}

impl SettingsError {
    /// True for the locally recoverable miss kinds (`NotFound`,
    /// `NoCandidate`); everything else must propagate.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::NoCandidate { .. })
    }
}
