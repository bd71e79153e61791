//! Error types for the managed fusion agent
//!
//! Store-level failures are classified here so reconcilers can tell a
//! retry-safe optimistic-concurrency conflict apart from any other API
//! failure without inspecting HTTP status codes themselves.

use thiserror::Error;

/// Main error type for store and client operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error that is not a version conflict
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// Optimistic concurrency failure: the object changed (or appeared)
    /// between our read and our write
    #[error("conflict writing {kind} {name}: {message}")]
    Conflict {
        /// Resource kind being written
        kind: String,
        /// Name of the object
        name: String,
        /// Message reported by the API server
        message: String,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "create_client", "bootstrap")
        context: String,
    },
}

impl Error {
    /// Create a conflict error for the given object
    pub fn conflict(
        kind: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            kind: kind.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Whether this is an optimistic-concurrency conflict
    ///
    /// Conflicts are resolved by re-running the whole pass against a fresh
    /// read, never by merging locally.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if this error is retryable
    ///
    /// Conflicts always are. Kubernetes errors are retryable unless the API
    /// server rejected the request outright (4xx).
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if (400..500).contains(&ae.code)
            ),
            Error::Conflict { .. } => true,
            Error::Internal { .. } => true,
        }
    }

    /// Get the context if this error has one
    pub fn context(&self) -> Option<&str> {
        match self {
            Error::Internal { context, .. } => Some(context),
            _ => None,
        }
    }
}
