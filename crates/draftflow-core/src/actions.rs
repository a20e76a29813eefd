//! Action resolution from service metadata
//!
//! The draft actions of an entity set are published through the
//! `DraftRoot` annotation. Resolution is a pure metadata read: absent
//! annotations resolve to `None` (an optional Preparation action is a
//! legitimate state, not an error), and nothing is cached, so repeated
//! calls cannot drift.

use crate::types::ActionDescriptor;
use draftflow_service::{
    HandleRef, OperationKind, DRAFT_ROOT_ANNOTATION, MESSAGES_ANNOTATION,
};

/// Resolves draft actions and related annotations for a document handle
pub trait ActionResolver: Send + Sync {
    /// The action name annotated for `kind`, if any
    fn resolve_action_name(&self, handle: &HandleRef, kind: OperationKind) -> Option<String>;

    /// The declared return type of the action annotated for `kind`
    ///
    /// `None` for actions without a return parameter; some backends omit
    /// it on Preparation.
    fn resolve_return_type(&self, handle: &HandleRef, kind: OperationKind) -> Option<String>;

    /// The annotated path to the document's messages
    fn resolve_messages_path(&self, handle: &HandleRef) -> Option<String>;

    /// Whether a Preparation action is declared at all
    fn has_preparation_action(&self, handle: &HandleRef) -> bool {
        self.resolve_action_name(handle, OperationKind::Preparation)
            .is_some()
    }

    /// Resolve name and return type together
    fn resolve(&self, handle: &HandleRef, kind: OperationKind) -> Option<ActionDescriptor> {
        let name = self.resolve_action_name(handle, kind)?;
        Some(ActionDescriptor {
            name,
            return_type: self.resolve_return_type(handle, kind),
        })
    }
}

/// [`ActionResolver`] backed by the meta model's `DraftRoot` annotation
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationActionResolver;

impl AnnotationActionResolver {
    /// Create a new resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `<metaPath>@DraftRoot/<Operation>` for the handle's entity set
    fn draft_root_path(handle: &HandleRef, kind: OperationKind) -> String {
        let meta = handle.model().meta_model();
        let meta_path = meta.meta_path(&handle.path());
        format!(
            "{meta_path}@{DRAFT_ROOT_ANNOTATION}/{}",
            kind.annotation_property()
        )
    }
}

impl ActionResolver for AnnotationActionResolver {
    fn resolve_action_name(&self, handle: &HandleRef, kind: OperationKind) -> Option<String> {
        let meta = handle.model().meta_model();
        meta.annotation(&Self::draft_root_path(handle, kind))
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|name| !name.is_empty())
    }

    fn resolve_return_type(&self, handle: &HandleRef, kind: OperationKind) -> Option<String> {
        let meta = handle.model().meta_model();
        let annotation_path = format!("{}/$ReturnType", Self::draft_root_path(handle, kind));
        meta.annotation(&annotation_path)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|return_type| !return_type.is_empty())
    }

    fn resolve_messages_path(&self, handle: &HandleRef) -> Option<String> {
        let meta = handle.model().meta_model();
        let meta_path = meta.meta_path(&handle.path());
        meta.annotation(&format!("{meta_path}/@{MESSAGES_ANNOTATION}/$Path"))
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|path| !path.is_empty())
    }
}
