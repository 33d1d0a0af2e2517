//! Error types and result aliases for Palisade.
//!
//! This module defines the shared error taxonomy used across all Palisade
//! components. Errors are structured for programmatic handling and carry
//! context for server-side logging; user-facing messages are derived at the
//! handler boundary, never from these types directly.

/// The result type used throughout Palisade.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Palisade operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A cache or record store operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An upstream catalog retrieval failed or timed out.
    #[error("fetch failed for {resource}: {message}")]
    Fetch {
        /// The upstream resource identifier that was being fetched.
        resource: String,
        /// Description of the fetch failure.
        message: String,
    },

    /// A submission could not be durably written.
    #[error("persistence failed: {message}")]
    Persistence {
        /// Description of the persistence failure.
        message: String,
    },

    /// Input failed validation.
    ///
    /// Reserved for future stricter input checks; ingestion is currently
    /// permissive by design.
    #[error("validation failed: {message}")]
    Validation {
        /// Description of what failed validation.
        message: String,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A key or object was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new fetch error for the given upstream resource.
    #[must_use]
    pub fn fetch(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            resource: resource.into(),
            message: message.into(),
        }
    }

    /// Creates a new persistence error with the given message.
    #[must_use]
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Returns true if this error is a not-found signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
