//! Collaborator traits of the draft lifecycle coordinator
//!
//! The coordinator receives one [`DocumentHandle`] per call and reaches the
//! rest of the stack through it: the owning [`DataModel`], its
//! [`MetaModel`], and the app-level services. All traits are object-safe;
//! the coordinator only ever holds `Arc<dyn …>`.

use crate::operation::{ConflictHandlingOptions, ConflictResolution, OperationRequest};
use crate::transport::TransportError;
use crate::vocabulary::{PROP_HAS_ACTIVE_ENTITY, PROP_IS_ACTIVE_ENTITY};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Shared reference to a document handle
pub type HandleRef = Arc<dyn DocumentHandle>;

/// One row/entity instance in the remote data model
///
/// Handles are caller-owned: the coordinator reads from them and may hand a
/// different handle back (the draft's or the sibling's), but never creates
/// or destroys the caller's own handle.
#[async_trait]
pub trait DocumentHandle: Send + Sync {
    /// Hierarchical path addressing this instance
    fn path(&self) -> String;

    /// Read an already-loaded property value
    fn property(&self, name: &str) -> Option<Value>;

    /// The model owning this handle
    fn model(&self) -> Arc<dyn DataModel>;

    /// Whether the handle's binding holds unsubmitted changes
    fn has_pending_changes(&self) -> bool;

    /// Discard pending changes on the handle's binding
    async fn reset_changes(&self) -> Result<(), TransportError>;

    /// Delete the entity this handle points at
    async fn delete(&self) -> Result<(), TransportError>;

    /// Request data relative to this handle; an empty path requests the
    /// entity itself. `Ok(None)` means the target does not exist.
    async fn request_object(&self, relative_path: &str) -> Result<Option<Value>, TransportError>;

    /// Request the canonical path of the entity this handle points at
    async fn request_canonical_path(&self) -> Result<String, TransportError>;

    /// `IsActiveEntity`, when loaded
    fn is_active_entity(&self) -> Option<bool> {
        self.property(PROP_IS_ACTIVE_ENTITY).and_then(|v| v.as_bool())
    }

    /// `HasActiveEntity`, when loaded
    fn has_active_entity(&self) -> Option<bool> {
        self.property(PROP_HAS_ACTIVE_ENTITY).and_then(|v| v.as_bool())
    }
}

/// The data model a handle belongs to
#[async_trait]
pub trait DataModel: Send + Sync {
    /// The metadata model of this service
    fn meta_model(&self) -> Arc<dyn MetaModel>;

    /// Bind a new handle at an absolute path without requesting data
    fn bind_context(&self, path: &str) -> HandleRef;

    /// Execute a bound operation
    ///
    /// Requests without a `group_id` are submitted by the transport on its
    /// own; requests with one stay queued until [`DataModel::submit_batch`]
    /// is called for that group. When the server answers a strict-handling
    /// request with a conflict, the transport invokes `conflict` and
    /// proceeds only on `true`.
    async fn execute_operation(
        &self,
        request: OperationRequest,
        conflict: Option<ConflictResolution>,
    ) -> Result<HandleRef, TransportError>;

    /// Flush all requests queued into `group_id`
    async fn submit_batch(&self, group_id: &str) -> Result<(), TransportError>;
}

/// Read access to service metadata
///
/// Resolution is side-effect free; absent annotations are `None`, never an
/// error.
pub trait MetaModel: Send + Sync {
    /// Map a data path to its metadata path (key predicates stripped)
    fn meta_path(&self, resource_path: &str) -> String;

    /// Read an annotation value at an absolute annotation path
    fn annotation(&self, annotation_path: &str) -> Option<Value>;
}

/// Side effects declared for an OData action
#[derive(Debug, Clone, Default)]
pub struct ActionSideEffects {
    /// Entity/property paths to refresh
    pub path_expressions: Vec<String>,
    /// Actions the server wants triggered alongside the refresh
    pub trigger_actions: Vec<String>,
}

/// The hosting app's side-effects facility
#[async_trait]
pub trait SideEffectsService: Send + Sync {
    /// Side effects declared for `action_name` in the context of `handle`
    fn action_side_effects(
        &self,
        action_name: &str,
        handle: &HandleRef,
    ) -> Option<ActionSideEffects>;

    /// Request a refresh of the given paths relative to `handle`
    async fn request_side_effects(
        &self,
        paths: &[String],
        handle: &HandleRef,
    ) -> Result<(), TransportError>;

    /// Request everything a declared action side effect asks for
    async fn request_side_effects_for_action(
        &self,
        effects: &ActionSideEffects,
        handle: &HandleRef,
    ) -> Result<(), TransportError>;
}

/// Transition-message bookkeeping of the hosting app
pub trait MessageHandler: Send + Sync {
    /// Drop transition messages previously shown for `path`, or all of
    /// them when `path` is `None`
    fn remove_transition_messages(&self, path: Option<&str>);
}

/// Everything a user needs to decide about overwriting a foreign draft
#[derive(Debug, Clone)]
pub struct OverwritePrompt {
    /// Display name of the user owning the unsaved draft
    pub created_by: Option<String>,
    /// Path of the document whose draft would be discarded
    pub document_path: String,
}

/// User confirmation boundary
///
/// `false` cancels the surrounding flow without an error.
#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    /// Ask whether another user's unsaved draft may be discarded
    async fn confirm_overwrite(&self, prompt: &OverwritePrompt, handle: &HandleRef) -> bool;
}

/// Callback the transport invokes on a strict-handling conflict mid-batch
#[async_trait]
pub trait StrictHandlingCallback: Send + Sync {
    /// Decide whether the conflicting request should be repeated without
    /// strict handling; `false` fails the request
    async fn on_strict_handling_failed(&self, options: &ConflictHandlingOptions) -> bool;
}

/// Shared reference to a strict-handling callback
pub type StrictHandlingCallbackRef = Arc<dyn StrictHandlingCallback>;
