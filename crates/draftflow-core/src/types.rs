//! Core types for the draft lifecycle coordinator
//!
//! Defines:
//! - Coordinator configuration (batch groups, defaults)
//! - Resolved action descriptors and operation receipts
//! - Sibling information and path mappings
//! - Draft administrative data
//! - The per-call application context

use draftflow_service::{
    ConflictHandlingOptions, ConflictResolution, ConfirmationProvider, HandleRef, MessageHandler,
    OperationKind, SideEffectsService, StrictHandlingCallbackRef,
};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Coordinator configuration
///
/// Group identifiers name the batch queues the coordinator shares with the
/// transport; they are stable API towards the hosting app's batch setup.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Batch group for the immediate edit request
    pub edit_group_id: String,
    /// Batch group shared by Preparation and Activation
    pub activation_group_id: String,
    /// Default for `PreserveChanges` when the caller does not decide
    pub preserve_changes_default: bool,
}

impl CoordinatorConfig {
    /// Create the default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            edit_group_id: "direct".to_string(),
            activation_group_id: "draft".to_string(),
            preserve_changes_default: true,
        }
    }

    /// Override the edit batch group
    #[inline]
    #[must_use]
    pub fn with_edit_group(mut self, group_id: impl Into<String>) -> Self {
        self.edit_group_id = group_id.into();
        self
    }

    /// Override the shared Preparation/Activation batch group
    #[inline]
    #[must_use]
    pub fn with_activation_group(mut self, group_id: impl Into<String>) -> Self {
        self.activation_group_id = group_id.into();
        self
    }

    /// Override the `PreserveChanges` default
    #[inline]
    #[must_use]
    pub fn with_preserve_changes_default(mut self, preserve: bool) -> Self {
        self.preserve_changes_default = preserve;
        self
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A resolved draft action
///
/// Recomputed from metadata on every call; never cached, so repeated
/// resolution cannot drift from the service metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    /// Fully qualified action name
    pub name: String,
    /// Declared return type path, absent for actions without a return
    /// parameter
    pub return_type: Option<String>,
}

/// Evidence that a result-less operation completed
///
/// Preparation has no interesting result handle; callers that need to know
/// it ran (validation) receive this receipt instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReceipt {
    /// Resolved action name that was executed
    pub action: String,
    /// The operation kind
    pub kind: OperationKind,
    /// Batch group the request was queued into, if any
    pub group_id: Option<String>,
}

/// One rewritten path prefix of a sibling chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    /// Prefix on the source document's side
    pub old_path: String,
    /// Equivalent prefix on the sibling's side
    pub new_path: String,
}

/// Result of a sibling-path resolution
///
/// `path_mapping` covers every keyed prefix along the chain, deepest
/// first: `path_mapping[0]` maps the target's own path.
#[derive(Clone)]
pub struct SiblingInformation {
    /// Handle bound at the sibling's path
    pub target: HandleRef,
    /// Prefix rewrites for the whole chain, deepest first
    pub path_mapping: Vec<PathMapping>,
}

impl fmt::Debug for SiblingInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SiblingInformation")
            .field("target", &self.target.path())
            .field("path_mapping", &self.path_mapping)
            .finish()
    }
}

/// Administrative metadata of a draft
///
/// Field names match the wire representation of the
/// `DraftAdministrativeData` navigation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftAdministrativeData {
    /// Whether the current user owns the draft
    #[serde(rename = "DraftIsCreatedByMe", default)]
    pub draft_is_created_by_me: bool,

    /// Technical name of the creating user
    #[serde(rename = "CreatedByUser", default)]
    pub created_by_user: Option<String>,

    /// Display name of the creating user
    #[serde(rename = "CreatedByUserDescription", default)]
    pub created_by_user_description: Option<String>,

    /// Technical name of the user currently editing, if any
    #[serde(rename = "InProcessByUser", default)]
    pub in_process_by_user: Option<String>,

    /// Display name of the user currently editing, if any
    #[serde(rename = "InProcessByUserDescription", default)]
    pub in_process_by_user_description: Option<String>,
}

impl DraftAdministrativeData {
    /// The user currently holding an in-process lock, preferring the
    /// display name
    #[must_use]
    pub fn in_process_user(&self) -> Option<&str> {
        non_empty(self.in_process_by_user_description.as_deref())
            .or_else(|| non_empty(self.in_process_by_user.as_deref()))
    }

    /// The user owning the unsaved draft, preferring the display name
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        non_empty(self.created_by_user_description.as_deref())
            .or_else(|| non_empty(self.created_by_user.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Per-call collaborator set of the hosting application
///
/// Bundles what older clients spread over positional arguments: the
/// side-effects service, the message handler, and the optional
/// strict-handling wiring.
#[derive(Clone)]
pub struct AppContext {
    /// The app's side-effects facility
    pub side_effects: Arc<dyn SideEffectsService>,
    /// The app's transition-message bookkeeping
    pub messages: Arc<dyn MessageHandler>,
    /// Callback for strict-handling conflicts, when the app supports them
    pub strict_handling: Option<StrictHandlingCallbackRef>,
    /// Localized operation label forwarded to conflict dialogs
    pub label: Option<String>,
}

impl AppContext {
    /// Create a context without strict-handling support
    #[must_use]
    pub fn new(
        side_effects: Arc<dyn SideEffectsService>,
        messages: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            side_effects,
            messages,
            strict_handling: None,
            label: None,
        }
    }

    /// Attach a strict-handling callback
    #[must_use]
    pub fn with_strict_handling(mut self, callback: StrictHandlingCallbackRef) -> Self {
        self.strict_handling = Some(callback);
        self
    }

    /// Attach a localized operation label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Build the conflict wiring for one operation execution
    #[must_use]
    pub(crate) fn conflict_resolution(&self, group_id: Option<&str>) -> Option<ConflictResolution> {
        self.strict_handling.as_ref().map(|callback| ConflictResolution {
            options: ConflictHandlingOptions {
                label: self.label.clone(),
                group_id: group_id.map(Into::into),
                replace_in_list_binding: false,
            },
            callback: Arc::clone(callback),
        })
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("strict_handling", &self.strict_handling.is_some())
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Parameters of [`create_draft_from_active_document`]
///
/// [`create_draft_from_active_document`]:
/// crate::coordinator::DraftCoordinator::create_draft_from_active_document
#[derive(Clone, Default)]
pub struct CreateDraftParameters {
    /// Override for the `PreserveChanges` default
    pub preserve_changes: Option<bool>,
    /// Confirmation boundary for the overwrite flow; absent means the
    /// overwrite is declined
    pub confirmation: Option<Arc<dyn ConfirmationProvider>>,
}

impl CreateDraftParameters {
    /// Parameters with defaults everywhere
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide `PreserveChanges` explicitly
    #[must_use]
    pub fn with_preserve_changes(mut self, preserve: bool) -> Self {
        self.preserve_changes = Some(preserve);
        self
    }

    /// Attach the confirmation boundary for the overwrite flow
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: Arc<dyn ConfirmationProvider>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }
}

impl fmt::Debug for CreateDraftParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateDraftParameters")
            .field("preserve_changes", &self.preserve_changes)
            .field("confirmation", &self.confirmation.is_some())
            .finish()
    }
}

/// Hooks around document activation
///
/// `before_activate` is the one cooperative cancellation point of the
/// protocol: returning `false` aborts before any network call.
#[async_trait::async_trait]
pub trait ActivationHooks: Send + Sync {
    /// Veto point ahead of activation; `false` aborts the flow
    async fn before_activate(&self, _handle: &HandleRef) -> bool {
        true
    }

    /// Map the activation result before it is returned to the caller
    async fn after_activate(&self, _draft: &HandleRef, active: HandleRef) -> HandleRef {
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn config_defaults() {
        let config = CoordinatorConfig::new();
        assert_eq!(config.edit_group_id, "direct");
        assert_eq!(config.activation_group_id, "draft");
        assert!(config.preserve_changes_default);
    }

    #[test]
    fn config_builders() {
        let config = CoordinatorConfig::new()
            .with_edit_group("immediate")
            .with_activation_group("lifecycle")
            .with_preserve_changes_default(false);
        assert_eq!(config.edit_group_id, "immediate");
        assert_eq!(config.activation_group_id, "lifecycle");
        assert!(!config.preserve_changes_default);
    }

    #[test]
    fn administrative_data_from_wire_names() {
        let admin: DraftAdministrativeData = serde_json::from_value(json!({
            "DraftIsCreatedByMe": false,
            "CreatedByUser": "DOE",
            "CreatedByUserDescription": "Jane Doe",
            "InProcessByUser": "",
        }))
        .unwrap();

        assert!(!admin.draft_is_created_by_me);
        assert_eq!(admin.created_by(), Some("Jane Doe"));
        assert_eq!(admin.in_process_user(), None);
    }

    #[test]
    fn administrative_data_display_name_fallback() {
        let admin: DraftAdministrativeData = serde_json::from_value(json!({
            "InProcessByUser": "SMITH",
        }))
        .unwrap();
        assert_eq!(admin.in_process_user(), Some("SMITH"));

        let admin: DraftAdministrativeData = serde_json::from_value(json!({
            "InProcessByUser": "SMITH",
            "InProcessByUserDescription": "John Smith",
        }))
        .unwrap();
        assert_eq!(admin.in_process_user(), Some("John Smith"));
    }

    #[test]
    fn administrative_data_tolerates_missing_fields() {
        let admin: DraftAdministrativeData = serde_json::from_value(json!({})).unwrap();
        assert_eq!(admin.created_by(), None);
        assert_eq!(admin.in_process_user(), None);
    }
}
