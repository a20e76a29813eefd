//! Error types for the draft lifecycle coordinator
//!
//! The taxonomy separates:
//! - Domain-precondition violations, raised before any remote call
//! - Transport failures, propagated verbatim and classified only where the
//!   protocol defines a reaction (the create-draft conflict branch)
//! - Lock conflicts surfaced with the owning user
//! - Caller-initiated cancellation, which callers treat as "nothing to
//!   surface"

use draftflow_path::PathError;
use draftflow_service::{ConflictKind, OperationKind, TransportError};

/// Main error type of the draft lifecycle coordinator
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    /// Operation requires the active document but got a draft
    #[error("the {0} can only be executed on an active document")]
    RequiresActiveDocument(OperationKind),

    /// Operation requires a draft but got the active document
    #[error("the {0} cannot be executed on an active document")]
    RequiresDraftDocument(OperationKind),

    /// The entity set does not declare the requested action
    #[error("no {kind} is declared for the entity set of '{path}'")]
    ActionNotDeclared {
        /// The operation whose action is missing
        kind: OperationKind,
        /// Path of the document the operation was attempted on
        path: String,
    },

    /// The document's draft is currently being worked on by another user
    #[error("document is locked by {user}")]
    LockedBy {
        /// Display name of the lock owner
        user: String,
    },

    /// A before-activate hook returned `false`
    #[error("activation was aborted by the before-activate hook")]
    ActivationVetoed,

    /// Caller-initiated cancellation
    #[error("operation cancelled")]
    Cancelled,

    /// Sibling resolution was attempted outside the root's subtree
    #[error("sibling resolution failed: {0}")]
    Path(#[from] PathError),

    /// The server returned administrative data the client cannot read
    #[error("malformed draft administrative data: {0}")]
    InvalidAdministrativeData(#[source] serde_json::Error),

    /// Failure surfaced by the transport, unmodified
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DraftError {
    /// Classify this error as a draft conflict, if it is one
    #[inline]
    #[must_use]
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        match self {
            Self::Transport(err) => err.conflict_kind(),
            _ => None,
        }
    }

    /// Check whether the error is a caller-initiated cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Transport(err) => err.is_cancelled(),
            _ => false,
        }
    }

    /// Check whether the error is a domain-precondition violation
    ///
    /// Precondition violations are raised before any remote call and are
    /// never worth retrying.
    #[inline]
    #[must_use]
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::RequiresActiveDocument(_)
                | Self::RequiresDraftDocument(_)
                | Self::ActionNotDeclared { .. }
                | Self::Path(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_kind_only_from_transport() {
        let err = DraftError::Transport(TransportError::with_status(409, "conflict"));
        assert_eq!(err.conflict_kind(), Some(ConflictKind::Conflict));

        let err = DraftError::RequiresActiveDocument(OperationKind::Edit);
        assert_eq!(err.conflict_kind(), None);
    }

    #[test]
    fn cancellation_from_both_shapes() {
        assert!(DraftError::Cancelled.is_cancelled());
        assert!(DraftError::Transport(TransportError::cancelled()).is_cancelled());
        assert!(!DraftError::ActivationVetoed.is_cancelled());
    }

    #[test]
    fn precondition_violations() {
        assert!(DraftError::RequiresDraftDocument(OperationKind::Activation)
            .is_precondition_violation());
        assert!(DraftError::ActionNotDeclared {
            kind: OperationKind::Discard,
            path: "/Entities(1)".to_string(),
        }
        .is_precondition_violation());
        assert!(!DraftError::Cancelled.is_precondition_violation());
    }

    #[test]
    fn error_display() {
        let err = DraftError::RequiresActiveDocument(OperationKind::Edit);
        assert_eq!(
            err.to_string(),
            "the EditAction can only be executed on an active document"
        );

        let err = DraftError::LockedBy {
            user: "Jane Doe".to_string(),
        };
        assert_eq!(err.to_string(), "document is locked by Jane Doe");
    }
}
