//! Reconcile error types

use std::time::Duration;

use fusion_common::kube_utils::AlreadyOwned;

use crate::spec::ValidationError;

/// Requeue delay after an optimistic-concurrency conflict
pub const CONFLICT_REQUEUE: Duration = Duration::from_secs(1);
/// Requeue delay after a transient store failure
pub const STORE_REQUEUE: Duration = Duration::from_secs(30);
/// Requeue delay for failures an operator has to fix outside the offering
pub const PERSISTENT_REQUEUE: Duration = Duration::from_secs(300);

/// Why a reconcile pass stopped
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The offering config is invalid; nothing was applied
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A count could not be represented
    #[error("cannot compute {field}: {message}")]
    Computation {
        /// Field being computed
        field: &'static str,
        /// What went wrong
        message: String,
    },

    /// Store read or write failed
    #[error("{0}")]
    Store(#[from] fusion_common::Error),

    /// A managed resource is controlled by something else
    #[error("{kind} {name} cannot be adopted: {source}")]
    AlreadyOwned {
        /// Kind of the managed resource
        kind: &'static str,
        /// Name of the managed resource
        name: String,
        /// Existing controller
        #[source]
        source: AlreadyOwned,
    },

    /// The offering has no UID yet, so children cannot reference it
    #[error("offering {0} has no uid; owned resources cannot be linked")]
    MissingOwnerIdentity(String),
}

impl ReconcileError {
    /// Create a computation error
    pub fn computation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Computation {
            field,
            message: message.into(),
        }
    }

    /// Whether the store rejected a write on a stale `resourceVersion`
    pub fn is_conflict(&self) -> bool {
        matches!(self, ReconcileError::Store(e) if e.is_conflict())
    }

    /// Whether re-running the pass without a spec change can help
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::Validation(_) | ReconcileError::Computation { .. } => false,
            ReconcileError::Store(e) => e.is_retryable(),
            ReconcileError::AlreadyOwned { .. } | ReconcileError::MissingOwnerIdentity(_) => true,
        }
    }

    /// How long to wait before the next attempt; `None` waits for a spec change
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            ReconcileError::Validation(_) | ReconcileError::Computation { .. } => None,
            ReconcileError::Store(e) if e.is_conflict() => Some(CONFLICT_REQUEUE),
            ReconcileError::Store(e) if e.is_retryable() => Some(STORE_REQUEUE),
            ReconcileError::Store(_) | ReconcileError::AlreadyOwned { .. } => {
                Some(PERSISTENT_REQUEUE)
            }
            ReconcileError::MissingOwnerIdentity(_) => Some(CONFLICT_REQUEUE),
        }
    }
}
