//! Operation invocation against the remote service
//!
//! [`OperationInvocation`] is a bound-but-unexecuted remote call. Execution
//! consumes the invocation, so "executed at most once" holds by
//! construction. The invoker resolves action names through the injected
//! [`ActionResolver`], builds the request, and hands it to the handle's
//! owning model; transport failures pass through unmodified, since conflict
//! interpretation is the coordinator's job alone.

use crate::actions::ActionResolver;
use crate::error::DraftError;
use crate::types::ActionDescriptor;
use async_trait::async_trait;
use draftflow_service::{
    ConflictResolution, HandleRef, OperationKind, OperationRequest, TransportError,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Options for creating an invocation
#[derive(Debug, Clone, Default)]
pub struct InvocationOptions {
    /// Action parameters in declaration order
    pub parameters: IndexMap<String, Value>,
    /// Additional `$select` paths for the operation response
    pub additional_select: Vec<String>,
    /// Inherit the binding's `$expand`/`$select` into the operation
    pub inherit_expand_select: bool,
}

/// Options for executing an invocation
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Batch group to queue the request into; `None` lets the transport
    /// submit on its own
    pub group_id: Option<String>,
    /// Send an unconditional concurrency match
    pub ignore_concurrency_token: bool,
    /// Strict-handling conflict wiring
    pub conflict: Option<ConflictResolution>,
}

/// A bound, parameterized, not-yet-executed remote call
///
/// Created by [`OperationInvoker::create_invocation`]; consumed by
/// [`OperationInvoker::execute`].
#[derive(Clone)]
pub struct OperationInvocation {
    handle: HandleRef,
    kind: OperationKind,
    descriptor: ActionDescriptor,
    options: InvocationOptions,
}

impl OperationInvocation {
    /// The operation kind this invocation was created for
    #[inline]
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// The resolved action
    #[inline]
    #[must_use]
    pub fn descriptor(&self) -> &ActionDescriptor {
        &self.descriptor
    }

    /// The handle the call is bound to
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &HandleRef {
        &self.handle
    }
}

impl std::fmt::Debug for OperationInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationInvocation")
            .field("kind", &self.kind)
            .field("action", &self.descriptor.name)
            .field("binding_path", &self.handle.path())
            .finish_non_exhaustive()
    }
}

/// Creates and executes remote draft operations
#[async_trait]
pub trait OperationInvoker: Send + Sync {
    /// Resolve the action for `kind` and bind a call against it
    ///
    /// # Errors
    /// [`DraftError::ActionNotDeclared`] when the entity set does not
    /// declare the action.
    fn create_invocation(
        &self,
        handle: &HandleRef,
        kind: OperationKind,
        options: InvocationOptions,
    ) -> Result<OperationInvocation, DraftError>;

    /// Execute a bound call
    ///
    /// Resolves with the resulting handle; rejects with the raw transport
    /// error. No retries, no status interpretation here.
    async fn execute(
        &self,
        invocation: OperationInvocation,
        options: ExecuteOptions,
    ) -> Result<HandleRef, TransportError>;

    /// Flush the batch group on the handle's owning model
    async fn submit_batch(&self, handle: &HandleRef, group_id: &str)
        -> Result<(), TransportError>;
}

/// [`OperationInvoker`] executing against the handle's owning model
#[derive(Clone)]
pub struct ModelOperationInvoker {
    resolver: Arc<dyn ActionResolver>,
}

impl ModelOperationInvoker {
    /// Create an invoker resolving actions through `resolver`
    #[must_use]
    pub fn new(resolver: Arc<dyn ActionResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl OperationInvoker for ModelOperationInvoker {
    fn create_invocation(
        &self,
        handle: &HandleRef,
        kind: OperationKind,
        options: InvocationOptions,
    ) -> Result<OperationInvocation, DraftError> {
        let descriptor =
            self.resolver
                .resolve(handle, kind)
                .ok_or_else(|| DraftError::ActionNotDeclared {
                    kind,
                    path: handle.path(),
                })?;

        tracing::debug!(action = %descriptor.name, binding = %handle.path(), "bound draft operation");

        Ok(OperationInvocation {
            handle: Arc::clone(handle),
            kind,
            descriptor,
            options,
        })
    }

    async fn execute(
        &self,
        invocation: OperationInvocation,
        options: ExecuteOptions,
    ) -> Result<HandleRef, TransportError> {
        let model = invocation.handle.model();
        let request = OperationRequest {
            action: invocation.descriptor.name.clone(),
            binding_path: invocation.handle.path(),
            parameters: invocation.options.parameters,
            select: invocation.options.additional_select,
            inherit_expand_select: invocation.options.inherit_expand_select,
            group_id: options.group_id,
            ignore_concurrency_token: options.ignore_concurrency_token,
        };

        model.execute_operation(request, options.conflict).await
    }

    async fn submit_batch(
        &self,
        handle: &HandleRef,
        group_id: &str,
    ) -> Result<(), TransportError> {
        handle.model().submit_batch(group_id).await
    }
}
