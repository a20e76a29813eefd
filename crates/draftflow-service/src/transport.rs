//! Transport errors and their conflict classification
//!
//! The transport surfaces failures unmodified; only the coordinator branches
//! on the conflict shape, and it does so through [`ConflictKind`] rather
//! than raw status literals.

/// Error raised by a remote request.
///
/// Lower layers propagate these verbatim. The optional HTTP status is
/// classified on demand via [`TransportError::conflict_kind`]; the
/// `cancelled` flag marks caller-initiated aborts (e.g. a dismissed dialog
/// bound into the request) that must not be surfaced as failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("remote request failed: {message}")]
pub struct TransportError {
    /// HTTP status code, when the failure carries one
    pub status: Option<u16>,
    /// Human-readable description from the transport
    pub message: String,
    /// Caller-initiated cancellation marker
    pub cancelled: bool,
}

impl TransportError {
    /// Create a transport error without a status code
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            cancelled: false,
        }
    }

    /// Create a transport error carrying an HTTP status
    #[must_use]
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
            cancelled: false,
        }
    }

    /// Create a cancellation marker
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            status: None,
            message: "request cancelled by caller".to_string(),
            cancelled: true,
        }
    }

    /// Check whether this failure is a caller-initiated cancellation
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Classify the failure as a draft conflict, if it is one
    #[inline]
    #[must_use]
    pub fn conflict_kind(&self) -> Option<ConflictKind> {
        self.status.and_then(ConflictKind::from_status)
    }
}

/// Closed classification of the HTTP statuses the draft protocol reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    /// 409: another draft already exists for the document
    Conflict,
    /// 412: concurrency token mismatch
    PreconditionFailed,
    /// 423: the document is locked by another user
    Locked,
}

impl ConflictKind {
    /// Map an HTTP status to a conflict kind
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            409 => Some(Self::Conflict),
            412 => Some(Self::PreconditionFailed),
            423 => Some(Self::Locked),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn conflict_statuses_classify() {
        assert_eq!(ConflictKind::from_status(409), Some(ConflictKind::Conflict));
        assert_eq!(
            ConflictKind::from_status(412),
            Some(ConflictKind::PreconditionFailed)
        );
        assert_eq!(ConflictKind::from_status(423), Some(ConflictKind::Locked));
    }

    #[test]
    fn non_conflict_statuses_do_not_classify() {
        for status in [400, 401, 403, 404, 500, 503] {
            assert_eq!(ConflictKind::from_status(status), None);
        }
    }

    #[test]
    fn transport_error_conflict_kind() {
        let err = TransportError::with_status(423, "locked");
        assert_eq!(err.conflict_kind(), Some(ConflictKind::Locked));

        let err = TransportError::new("boom");
        assert_eq!(err.conflict_kind(), None);
    }

    #[test]
    fn cancellation_marker() {
        assert!(TransportError::cancelled().is_cancelled());
        assert!(!TransportError::new("boom").is_cancelled());
    }
}
