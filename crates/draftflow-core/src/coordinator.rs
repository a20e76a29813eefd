//! Draft lifecycle coordination
//!
//! The coordinator is the one layer that understands the draft protocol's
//! state machine: which operation is legal in which document state, how
//! Prepare and Activate share a batch, and how an edit conflict is
//! recovered: by switching to the user's own existing draft when there is
//! one, or by asking permission to overwrite a foreign unsaved draft.
//!
//! Collaborators are injected, so tests substitute any of them without
//! touching the others.

use crate::actions::{ActionResolver, AnnotationActionResolver};
use crate::error::DraftError;
use crate::invoker::{ExecuteOptions, InvocationOptions, ModelOperationInvoker, OperationInvoker};
use crate::sibling::{CanonicalPathSiblingResolver, SiblingResolver};
use crate::types::{
    ActivationHooks, AppContext, CoordinatorConfig, CreateDraftParameters,
    DraftAdministrativeData, OperationReceipt,
};
use draftflow_service::{
    HandleRef, OperationKind, OverwritePrompt, DRAFT_ADMINISTRATIVE_DATA, PARAM_PRESERVE_CHANGES,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// The draft lifecycle state machine
///
/// Orchestrates create-draft, validate, activate, and discard/delete flows
/// against a remote draft-enabled service.
#[derive(Clone)]
pub struct DraftCoordinator {
    resolver: Arc<dyn ActionResolver>,
    invoker: Arc<dyn OperationInvoker>,
    sibling: Arc<dyn SiblingResolver>,
    config: CoordinatorConfig,
}

impl DraftCoordinator {
    /// Coordinator with the default collaborators and configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CoordinatorConfig::default())
    }

    /// Coordinator with the default collaborators
    #[must_use]
    pub fn with_config(config: CoordinatorConfig) -> Self {
        let resolver: Arc<dyn ActionResolver> = Arc::new(AnnotationActionResolver::new());
        Self {
            invoker: Arc::new(ModelOperationInvoker::new(Arc::clone(&resolver))),
            sibling: Arc::new(CanonicalPathSiblingResolver::new()),
            resolver,
            config,
        }
    }

    /// Coordinator over caller-supplied collaborators
    #[must_use]
    pub fn with_collaborators(
        resolver: Arc<dyn ActionResolver>,
        invoker: Arc<dyn OperationInvoker>,
        sibling: Arc<dyn SiblingResolver>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            resolver,
            invoker,
            sibling,
            config,
        }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Create a draft from an active document via the Edit action
    ///
    /// The request inherits the binding's `$expand`/`$select`, travels in
    /// the edit batch group, and is submitted immediately.
    ///
    /// # Errors
    /// - [`DraftError::RequiresActiveDocument`] before any remote call when
    ///   the handle is already a draft
    /// - transport failures verbatim, including conflicts; interpreting
    ///   them is [`Self::create_draft_from_active_document`]'s job
    pub async fn execute_edit_action(
        &self,
        handle: &HandleRef,
        preserve_changes: bool,
        app: &AppContext,
    ) -> Result<HandleRef, DraftError> {
        ensure_operation_state(handle, OperationKind::Edit)?;
        tracing::info!(path = %handle.path(), preserve_changes, "executing edit action");

        let mut parameters = IndexMap::new();
        parameters.insert(
            PARAM_PRESERVE_CHANGES.to_string(),
            Value::Bool(preserve_changes),
        );
        let invocation = self.invoker.create_invocation(
            handle,
            OperationKind::Edit,
            InvocationOptions {
                parameters,
                additional_select: Vec::new(),
                inherit_expand_select: true,
            },
        )?;

        let group_id = self.config.edit_group_id.clone();
        let execute = self.invoker.execute(
            invocation,
            ExecuteOptions {
                group_id: Some(group_id.clone()),
                ignore_concurrency_token: false,
                conflict: app.conflict_resolution(Some(&group_id)),
            },
        );
        let submit = self.invoker.submit_batch(handle, &group_id);

        // Failures of the flush surface on the operation itself; the
        // submit result only matters for the trace.
        let (result, submit_result) = futures::join!(execute, submit);
        if let Err(err) = submit_result {
            tracing::debug!(group = %group_id, error = %err, "batch submission reported a failure");
        }

        Ok(result?)
    }

    /// Run server-side draft validation, when the service supports it
    ///
    /// Validation needs both a messages annotation and a Preparation
    /// action; without either it is a no-op. Failures are logged and
    /// swallowed, so validation never blocks the caller's flow.
    pub async fn execute_validation(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        ignore_concurrency_token: bool,
    ) -> Option<OperationReceipt> {
        let messages_path = self.resolver.resolve_messages_path(handle)?;
        if !self.resolver.has_preparation_action(handle) {
            return None;
        }

        let result = self
            .execute_preparation_action(handle, None, true, ignore_concurrency_token)
            .await;
        match result {
            Ok(Some(receipt)) => {
                if self
                    .resolver
                    .resolve_return_type(handle, OperationKind::Preparation)
                    .is_none()
                {
                    // The operation response carries nothing; fetch the
                    // messages explicitly.
                    if let Err(err) = app
                        .side_effects
                        .request_side_effects(&[messages_path], handle)
                        .await
                    {
                        tracing::error!(error = %err, "failed to request messages after preparation");
                    }
                }
                Some(receipt)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::error!(error = %err, path = %handle.path(), "draft validation failed");
                None
            }
        }
    }

    /// Activate a draft via the Activation action
    ///
    /// When a Preparation action exists the activation sends an
    /// unconditional concurrency match: with Prepare in the same batch
    /// the stored token is stale by protocol convention. On failure the
    /// coordinator retrieves diagnostics best-effort (Edit-action side
    /// effects, falling back to a plain messages request) and rethrows
    /// the original error.
    ///
    /// # Errors
    /// - [`DraftError::RequiresDraftDocument`] before any remote call when
    ///   the handle is active
    /// - the original transport failure, never a recovery failure
    pub async fn execute_activation_action(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        group_id: Option<&str>,
    ) -> Result<HandleRef, DraftError> {
        ensure_operation_state(handle, OperationKind::Activation)?;
        let has_preparation = self.resolver.has_preparation_action(handle);

        let invocation = self.invoker.create_invocation(
            handle,
            OperationKind::Activation,
            InvocationOptions::default(),
        )?;
        let result = self
            .invoker
            .execute(
                invocation,
                ExecuteOptions {
                    group_id: group_id.map(str::to_string),
                    ignore_concurrency_token: has_preparation,
                    conflict: None,
                },
            )
            .await;

        match result {
            Ok(active) => Ok(active),
            Err(err) => {
                if has_preparation {
                    self.recover_activation_diagnostics(handle, app).await;
                }
                Err(err.into())
            }
        }
    }

    /// Run the Preparation action
    ///
    /// With `with_messages` the annotated messages path is selected into
    /// the response. Execution failures resolve `Ok(None)`; callers treat
    /// a missing receipt as "preparation did not run".
    ///
    /// # Errors
    /// [`DraftError::RequiresDraftDocument`] before any remote call when
    /// the handle is active.
    pub async fn execute_preparation_action(
        &self,
        handle: &HandleRef,
        group_id: Option<&str>,
        with_messages: bool,
        ignore_concurrency_token: bool,
    ) -> Result<Option<OperationReceipt>, DraftError> {
        ensure_operation_state(handle, OperationKind::Preparation)?;
        if !self.resolver.has_preparation_action(handle) {
            tracing::debug!(path = %handle.path(), "no preparation action declared");
            return Ok(None);
        }

        let mut options = InvocationOptions::default();
        if with_messages {
            if let Some(path) = self.resolver.resolve_messages_path(handle) {
                options.additional_select.push(path);
            }
        }
        let invocation =
            self.invoker
                .create_invocation(handle, OperationKind::Preparation, options)?;
        let action = invocation.descriptor().name.clone();

        let result = self
            .invoker
            .execute(
                invocation,
                ExecuteOptions {
                    group_id: group_id.map(str::to_string),
                    ignore_concurrency_token,
                    conflict: None,
                },
            )
            .await;
        match result {
            Ok(_) => Ok(Some(OperationReceipt {
                action,
                kind: OperationKind::Preparation,
                group_id: group_id.map(str::to_string),
            })),
            Err(err) => {
                tracing::error!(error = %err, path = %handle.path(), "preparation request failed");
                Ok(None)
            }
        }
    }

    /// Discard a draft via the declared Discard action
    ///
    /// # Errors
    /// - [`DraftError::RequiresDraftDocument`] when the handle is active
    /// - [`DraftError::ActionNotDeclared`] when no Discard action exists;
    ///   [`Self::delete_draft`] routes that case to a plain delete
    pub async fn execute_discard_action(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        strict_handling: bool,
    ) -> Result<bool, DraftError> {
        ensure_operation_state(handle, OperationKind::Discard)?;
        tracing::info!(path = %handle.path(), "executing discard action");

        let invocation = self.invoker.create_invocation(
            handle,
            OperationKind::Discard,
            InvocationOptions::default(),
        )?;
        let conflict = if strict_handling {
            app.conflict_resolution(None)
        } else {
            None
        };
        self.invoker
            .execute(
                invocation,
                ExecuteOptions {
                    group_id: None,
                    ignore_concurrency_token: false,
                    conflict,
                },
            )
            .await?;
        Ok(true)
    }

    /// Create a draft for an active document, recovering from conflicts
    ///
    /// The happy path is a single Edit call. When the edit fails with a
    /// draft conflict (409/412/423), the coordinator first looks for an
    /// existing draft of the current user at the sibling path and returns
    /// it when found; otherwise it inspects the draft's administrative
    /// data, failing loudly when another user holds an in-process lock
    /// and asking for confirmation before overwriting a foreign unsaved
    /// draft with a `PreserveChanges = false` retry.
    ///
    /// Resolves `Ok(None)` when the flow was cancelled (declined
    /// confirmation or a cancelled request); cancellation is not an
    /// error.
    ///
    /// # Errors
    /// - [`DraftError::LockedBy`] when another user is editing right now
    /// - unrecognized transport failures verbatim
    pub async fn create_draft_from_active_document(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        parameters: CreateDraftParameters,
    ) -> Result<Option<HandleRef>, DraftError> {
        let preserve_changes = parameters
            .preserve_changes
            .unwrap_or(self.config.preserve_changes_default);
        tracing::info!(path = %handle.path(), preserve_changes, "creating draft from active document");

        let draft = match self.execute_edit_action(handle, preserve_changes, app).await {
            Ok(draft) => Some(draft),
            Err(err) if err.conflict_kind().is_some() => {
                self.recover_from_edit_conflict(handle, app, &parameters, err)
                    .await?
            }
            Err(err) if err.is_cancelled() => {
                tracing::debug!(path = %handle.path(), "draft creation cancelled");
                None
            }
            Err(err) => return Err(err),
        };

        let Some(draft) = draft else {
            return Ok(None);
        };
        self.request_edit_trigger_side_effects(&draft, app).await;
        Ok(Some(draft))
    }

    /// Activate a draft, preparing it in the same batch when supported
    ///
    /// `hooks.before_activate` is the cooperative cancellation point: a
    /// `false` aborts before any network call. With a Preparation action,
    /// Prepare and Activate share one batch group in separate changesets;
    /// on failure a fresh Preparation retrieves the validation messages
    /// and stale transition messages for the document are dropped before
    /// the original failure is rethrown.
    ///
    /// # Errors
    /// - [`DraftError::ActivationVetoed`] when the hook declines
    /// - the original activation failure; recovery failures never replace
    ///   it
    pub async fn activate_document(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        hooks: Option<&dyn ActivationHooks>,
    ) -> Result<HandleRef, DraftError> {
        if let Some(hooks) = hooks {
            if !hooks.before_activate(handle).await {
                tracing::debug!(path = %handle.path(), "activation vetoed by the before-activate hook");
                return Err(DraftError::ActivationVetoed);
            }
        }

        let active = if self.resolver.has_preparation_action(handle) {
            self.activate_with_preparation(handle, app).await?
        } else {
            self.execute_activation_action(handle, app, None).await?
        };
        tracing::info!(path = %active.path(), "document activated");

        Ok(match hooks {
            Some(hooks) => hooks.after_activate(handle, active).await,
            None => active,
        })
    }

    /// Remove a draft, or an active document, whichever way the service
    /// supports
    ///
    /// Active documents and drafts without a declared Discard action are
    /// deleted directly, resetting pending changes on the binding first,
    /// since they would fail the delete. Drafts with a Discard action go
    /// through [`Self::execute_discard_action`].
    ///
    /// # Errors
    /// Reset, delete, and discard failures propagate verbatim.
    pub async fn delete_draft(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        strict_handling: bool,
    ) -> Result<bool, DraftError> {
        let is_active = handle.is_active_entity() == Some(true);
        let has_discard = self
            .resolver
            .resolve_action_name(handle, OperationKind::Discard)
            .is_some();

        if is_active || !has_discard {
            if handle.has_pending_changes() {
                handle.reset_changes().await?;
            }
            handle.delete().await?;
            tracing::info!(path = %handle.path(), "document deleted");
            Ok(true)
        } else {
            self.execute_discard_action(handle, app, strict_handling).await
        }
    }

    /// Prepare and activate in one shared batch group.
    async fn activate_with_preparation(
        &self,
        handle: &HandleRef,
        app: &AppContext,
    ) -> Result<HandleRef, DraftError> {
        let group_id = self.config.activation_group_id.clone();

        // One batch, separate changesets: the server processes Prepare
        // before Activate, and a Prepare failure does not roll back the
        // Activate at the transport level.
        let preparation =
            self.execute_preparation_action(handle, Some(group_id.as_str()), false, false);
        let activation = self.execute_activation_action(handle, app, Some(group_id.as_str()));
        let submit = self.invoker.submit_batch(handle, &group_id);

        let (preparation_result, activation_result, submit_result) =
            futures::join!(preparation, activation, submit);
        if let Err(err) = submit_result {
            tracing::debug!(group = %group_id, error = %err, "batch submission reported a failure");
        }
        drop(preparation_result);

        match activation_result {
            Ok(active) => Ok(active),
            Err(original) => {
                self.recover_activation_messages(handle, app).await;
                Err(original)
            }
        }
    }

    /// Pull validation messages after a failed batched activation.
    ///
    /// Best-effort by design: every failure in here is logged and
    /// dropped; the caller rethrows the original activation error.
    async fn recover_activation_messages(&self, handle: &HandleRef, app: &AppContext) {
        // Fresh batch; the failed group is already closed.
        match self.execute_preparation_action(handle, None, true, false).await {
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "re-preparation failed during activation recovery");
                return;
            }
        }

        let Some(messages_path) = self.resolver.resolve_messages_path(handle) else {
            return;
        };
        match handle.request_object(&messages_path).await {
            Ok(Some(Value::Array(messages))) if !messages.is_empty() => {
                // The preparation response supersedes what is on screen.
                app.messages.remove_transition_messages(Some(&handle.path()));
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "failed to read messages during activation recovery");
            }
        }
    }

    /// Best-effort diagnostics after a failed activation request.
    async fn recover_activation_diagnostics(&self, handle: &HandleRef, app: &AppContext) {
        let declared = self
            .resolver
            .resolve_action_name(handle, OperationKind::Edit)
            .and_then(|action| app.side_effects.action_side_effects(&action, handle))
            .filter(|effects| !effects.path_expressions.is_empty());

        let outcome = if let Some(effects) = declared {
            app.side_effects
                .request_side_effects(&effects.path_expressions, handle)
                .await
        } else if let Some(messages_path) = self.resolver.resolve_messages_path(handle) {
            app.side_effects
                .request_side_effects(&[messages_path], handle)
                .await
        } else {
            Ok(())
        };

        if let Err(err) = outcome {
            tracing::warn!(error = %err, "failed to retrieve diagnostics after activation failure");
        }
    }

    /// Conflict branch of [`Self::create_draft_from_active_document`].
    async fn recover_from_edit_conflict(
        &self,
        handle: &HandleRef,
        app: &AppContext,
        parameters: &CreateDraftParameters,
        original: DraftError,
    ) -> Result<Option<HandleRef>, DraftError> {
        tracing::debug!(
            path = %handle.path(),
            kind = ?original.conflict_kind(),
            "edit rejected with a draft conflict, probing for an existing draft"
        );

        // Stale transition messages from the failed edit would shadow the
        // recovery's outcome.
        app.messages.remove_transition_messages(None);

        if let Some(info) = self.sibling.compute_sibling_information(handle, handle).await? {
            // The current user already has a draft; load it and switch.
            info.target.request_object("").await?;
            tracing::info!(draft = %info.target.path(), "switching to the user's existing draft");
            return Ok(Some(info.target));
        }

        // No sibling of our own, so the draft belongs to someone else.
        let Some(admin_value) = handle.request_object(DRAFT_ADMINISTRATIVE_DATA).await? else {
            return Err(original);
        };
        let admin: DraftAdministrativeData =
            serde_json::from_value(admin_value).map_err(DraftError::InvalidAdministrativeData)?;

        if let Some(user) = admin.in_process_user() {
            return Err(DraftError::LockedBy {
                user: user.to_string(),
            });
        }

        let prompt = OverwritePrompt {
            created_by: admin.created_by().map(str::to_string),
            document_path: handle.path(),
        };
        let confirmed = match &parameters.confirmation {
            Some(confirmation) => confirmation.confirm_overwrite(&prompt, handle).await,
            None => false,
        };
        if !confirmed {
            tracing::debug!(path = %handle.path(), "overwrite of the foreign draft declined");
            return Ok(None);
        }

        // The retry discards the other user's unsaved changes.
        let draft = self.execute_edit_action(handle, false, app).await?;
        Ok(Some(draft))
    }

    /// Trigger-action side effects declared for the Edit action.
    async fn request_edit_trigger_side_effects(&self, draft: &HandleRef, app: &AppContext) {
        let Some(action) = self.resolver.resolve_action_name(draft, OperationKind::Edit) else {
            return;
        };
        let Some(effects) = app.side_effects.action_side_effects(&action, draft) else {
            return;
        };
        if effects.trigger_actions.is_empty() {
            return;
        }
        if let Err(err) = app
            .side_effects
            .request_side_effects_for_action(&effects, draft)
            .await
        {
            tracing::warn!(error = %err, "failed to request edit side effects");
        }
    }
}

impl Default for DraftCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DraftCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftCoordinator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Enforce the document-state invariant of an operation before any remote
/// call is made.
fn ensure_operation_state(handle: &HandleRef, kind: OperationKind) -> Result<(), DraftError> {
    let is_active = handle.is_active_entity();
    if kind.requires_active() {
        if is_active != Some(true) {
            return Err(DraftError::RequiresActiveDocument(kind));
        }
    } else if is_active == Some(true) {
        return Err(DraftError::RequiresDraftDocument(kind));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_requires_active_state() {
        let handle = draftflow_test_utils::draft_service()
            .build()
            .handle("/Entities(1)", false, true);
        let result = ensure_operation_state(&handle, OperationKind::Edit);
        assert!(matches!(result, Err(DraftError::RequiresActiveDocument(_))));
    }

    #[test]
    fn draft_operations_reject_active_state() {
        let service = draftflow_test_utils::draft_service().build();
        let handle = service.handle("/Entities(1)", true, false);
        for kind in [
            OperationKind::Activation,
            OperationKind::Discard,
            OperationKind::Preparation,
        ] {
            let result = ensure_operation_state(&handle, kind);
            assert!(matches!(result, Err(DraftError::RequiresDraftDocument(_))));
        }
    }

    #[test]
    fn unknown_state_passes_for_draft_operations() {
        let service = draftflow_test_utils::draft_service().build();
        let handle = service.handle_without_state("/Entities(1)");
        assert!(ensure_operation_state(&handle, OperationKind::Activation).is_ok());
        assert!(ensure_operation_state(&handle, OperationKind::Edit).is_err());
    }
}
