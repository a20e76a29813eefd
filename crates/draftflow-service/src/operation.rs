//! Operation vocabulary and request shapes
//!
//! [`OperationKind`] names the four draft operations and knows which entity
//! state each one requires. [`OperationRequest`] is the fully-bound call the
//! coordinator hands to the data model for execution.

use crate::boundary::StrictHandlingCallbackRef;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::{self, Display, Formatter};

/// The four operations of the draft protocol
///
/// Each maps to a server-declared action discoverable from the
/// `DraftRoot` annotation on the entity set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Create a draft from an active document
    Edit,
    /// Turn a draft back into the active document
    Activation,
    /// Remove a draft through the declared discard action
    Discard,
    /// Server-side validation of a draft
    Preparation,
}

impl OperationKind {
    /// Property of the `DraftRoot` annotation naming the action
    #[inline]
    #[must_use]
    pub fn annotation_property(self) -> &'static str {
        match self {
            Self::Edit => "EditAction",
            Self::Activation => "ActivationAction",
            Self::Discard => "DiscardAction",
            Self::Preparation => "PreparationAction",
        }
    }

    /// Whether the operation is only valid on an active document
    ///
    /// Edit requires the active document; the other three must only ever
    /// run against a draft.
    #[inline]
    #[must_use]
    pub fn requires_active(self) -> bool {
        matches!(self, Self::Edit)
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.annotation_property())
    }
}

/// A fully-bound remote operation call
///
/// Produced by the operation invoker from an invocation plus its execution
/// options; consumed by [`DataModel::execute_operation`].
///
/// [`DataModel::execute_operation`]: crate::boundary::DataModel::execute_operation
#[derive(Debug, Clone)]
pub struct OperationRequest {
    /// Resolved action name
    pub action: String,
    /// Path of the document the action is bound to
    pub binding_path: String,
    /// Action parameters in declaration order
    pub parameters: IndexMap<String, Value>,
    /// Additional `$select` paths for the operation response
    pub select: Vec<String>,
    /// Inherit the binding's `$expand`/`$select` into the operation
    pub inherit_expand_select: bool,
    /// Batch group the request is queued into; `None` lets the transport
    /// submit on its own
    pub group_id: Option<String>,
    /// Send an unconditional concurrency match instead of the stored token
    pub ignore_concurrency_token: bool,
}

/// Options handed to a strict-handling callback when the transport signals
/// a mid-batch conflict
///
/// Replaces the positional placeholder-argument binding of older clients
/// with one typed struct.
#[derive(Debug, Clone, Default)]
pub struct ConflictHandlingOptions {
    /// Localized label of the operation, for dialogs
    pub label: Option<String>,
    /// Batch group the conflicting request was queued into
    pub group_id: Option<String>,
    /// Replace the document in its list binding after resolution
    pub replace_in_list_binding: bool,
}

/// A strict-handling callback paired with the options it is invoked with
#[derive(Clone)]
pub struct ConflictResolution {
    /// Options forwarded to the callback
    pub options: ConflictHandlingOptions,
    /// The callback the transport invokes on a strict-handling failure
    pub callback: StrictHandlingCallbackRef,
}

impl fmt::Debug for ConflictResolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConflictResolution")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_annotation_properties() {
        assert_eq!(OperationKind::Edit.annotation_property(), "EditAction");
        assert_eq!(
            OperationKind::Activation.annotation_property(),
            "ActivationAction"
        );
        assert_eq!(OperationKind::Discard.annotation_property(), "DiscardAction");
        assert_eq!(
            OperationKind::Preparation.annotation_property(),
            "PreparationAction"
        );
    }

    #[test]
    fn only_edit_requires_active() {
        assert!(OperationKind::Edit.requires_active());
        assert!(!OperationKind::Activation.requires_active());
        assert!(!OperationKind::Discard.requires_active());
        assert!(!OperationKind::Preparation.requires_active());
    }

    #[test]
    fn operation_kind_display() {
        assert_eq!(OperationKind::Preparation.to_string(), "PreparationAction");
    }
}
