//! Scripted fakes for the data and metadata model
//!
//! [`FakeDataModel`] records every operation execution, batch submission,
//! delete, and reset, and replays scripted outcomes keyed by action name.
//! Canonical-path requests are scripted per bound path, so sibling
//! resolution scenarios control exactly which levels of a chain resolve.

use async_trait::async_trait;
use draftflow_service::{
    ConflictResolution, DataModel, DocumentHandle, HandleRef, MetaModel, OperationKind,
    OperationRequest, TransportError, DRAFT_ROOT_ANNOTATION, MESSAGES_ANNOTATION,
    PROP_HAS_ACTIVE_ENTITY, PROP_IS_ACTIVE_ENTITY,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Annotation-table metadata model
#[derive(Debug, Default)]
pub struct FakeMetaModel {
    annotations: HashMap<String, Value>,
}

impl FakeMetaModel {
    #[must_use]
    pub fn new(annotations: HashMap<String, Value>) -> Self {
        Self { annotations }
    }
}

impl MetaModel for FakeMetaModel {
    fn meta_path(&self, resource_path: &str) -> String {
        resource_path
            .split('/')
            .map(draftflow_path::strip_key_predicate)
            .collect::<Vec<_>>()
            .join("/")
    }

    fn annotation(&self, annotation_path: &str) -> Option<Value> {
        self.annotations.get(annotation_path).cloned()
    }
}

/// One recorded `execute_operation` call
#[derive(Debug, Clone)]
pub struct RecordedOperation {
    pub request: OperationRequest,
    pub had_conflict_handler: bool,
}

/// Properties and path of a handle produced by a scripted operation
#[derive(Debug, Clone)]
pub struct FakeHandleSpec {
    path: String,
    properties: HashMap<String, Value>,
}

impl FakeHandleSpec {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            properties: HashMap::new(),
        }
    }

    /// Spec for an active document
    #[must_use]
    pub fn active(path: impl Into<String>) -> Self {
        Self::new(path)
            .with_property(PROP_IS_ACTIVE_ENTITY, Value::Bool(true))
            .with_property(PROP_HAS_ACTIVE_ENTITY, Value::Bool(false))
    }

    /// Spec for a draft with an active counterpart
    #[must_use]
    pub fn draft(path: impl Into<String>) -> Self {
        Self::new(path)
            .with_property(PROP_IS_ACTIVE_ENTITY, Value::Bool(false))
            .with_property(PROP_HAS_ACTIVE_ENTITY, Value::Bool(true))
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

#[derive(Default)]
struct ModelState {
    operations: Vec<RecordedOperation>,
    outcomes: HashMap<String, VecDeque<Result<FakeHandleSpec, TransportError>>>,
    canonical_paths: HashMap<String, Result<String, TransportError>>,
    canonical_requests: usize,
    objects: HashMap<(String, String), Value>,
    object_failures: HashMap<(String, String), TransportError>,
    submitted_batches: Vec<String>,
    deleted: Vec<String>,
    resets: Vec<String>,
    delete_failure: Option<TransportError>,
    reset_failure: Option<TransportError>,
}

/// Recording, scripted data model
#[derive(Clone)]
pub struct FakeDataModel {
    inner: Arc<ModelInner>,
}

struct ModelInner {
    meta: Arc<FakeMetaModel>,
    state: Mutex<ModelState>,
}

impl FakeDataModel {
    #[must_use]
    pub fn new(meta: FakeMetaModel) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                meta: Arc::new(meta),
                state: Mutex::new(ModelState::default()),
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ModelState> {
        self.inner.state.lock().expect("model state lock")
    }

    /// Queue an outcome for the next execution of `action`
    ///
    /// The last queued outcome repeats once the queue runs dry.
    pub fn script_operation(
        &self,
        action: impl Into<String>,
        outcome: Result<FakeHandleSpec, TransportError>,
    ) {
        self.state()
            .outcomes
            .entry(action.into())
            .or_default()
            .push_back(outcome);
    }

    /// Script the canonical path answered for a bound path
    pub fn script_canonical_path(
        &self,
        bound_path: impl Into<String>,
        outcome: Result<String, TransportError>,
    ) {
        self.state()
            .canonical_paths
            .insert(bound_path.into(), outcome);
    }

    /// Store data served by `request_object(relative)` on `handle_path`
    pub fn put_object(
        &self,
        handle_path: impl Into<String>,
        relative: impl Into<String>,
        value: Value,
    ) {
        self.state()
            .objects
            .insert((handle_path.into(), relative.into()), value);
    }

    /// Make `request_object(relative)` on `handle_path` fail
    pub fn fail_object(
        &self,
        handle_path: impl Into<String>,
        relative: impl Into<String>,
        error: TransportError,
    ) {
        self.state()
            .object_failures
            .insert((handle_path.into(), relative.into()), error);
    }

    /// Make the next delete fail
    pub fn fail_delete(&self, error: TransportError) {
        self.state().delete_failure = Some(error);
    }

    /// Make the next reset fail
    pub fn fail_reset(&self, error: TransportError) {
        self.state().reset_failure = Some(error);
    }

    #[must_use]
    pub fn recorded_operations(&self) -> Vec<RecordedOperation> {
        self.state().operations.clone()
    }

    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.state().operations.len()
    }

    #[must_use]
    pub fn canonical_request_count(&self) -> usize {
        self.state().canonical_requests
    }

    #[must_use]
    pub fn submitted_batches(&self) -> Vec<String> {
        self.state().submitted_batches.clone()
    }

    #[must_use]
    pub fn deleted_paths(&self) -> Vec<String> {
        self.state().deleted.clone()
    }

    #[must_use]
    pub fn reset_paths(&self) -> Vec<String> {
        self.state().resets.clone()
    }

    fn handle_at(&self, path: &str, properties: HashMap<String, Value>) -> HandleRef {
        Arc::new(FakeDocumentHandle {
            model: self.clone(),
            path: path.to_string(),
            properties,
            pending_changes: false,
        })
    }
}

#[async_trait]
impl DataModel for FakeDataModel {
    fn meta_model(&self) -> Arc<dyn MetaModel> {
        Arc::clone(&self.inner.meta) as Arc<dyn MetaModel>
    }

    fn bind_context(&self, path: &str) -> HandleRef {
        self.handle_at(path, HashMap::new())
    }

    async fn execute_operation(
        &self,
        request: OperationRequest,
        conflict: Option<ConflictResolution>,
    ) -> Result<HandleRef, TransportError> {
        let outcome = {
            let mut state = self.state();
            state.operations.push(RecordedOperation {
                request: request.clone(),
                had_conflict_handler: conflict.is_some(),
            });
            state.outcomes.get_mut(&request.action).and_then(|queue| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
        };

        match outcome {
            Some(Ok(spec)) => Ok(self.handle_at(&spec.path, spec.properties)),
            Some(Err(err)) => Err(err),
            None => Ok(self.handle_at(&request.binding_path, HashMap::new())),
        }
    }

    async fn submit_batch(&self, group_id: &str) -> Result<(), TransportError> {
        self.state().submitted_batches.push(group_id.to_string());
        Ok(())
    }
}

/// In-memory document handle bound to a [`FakeDataModel`]
pub struct FakeDocumentHandle {
    model: FakeDataModel,
    path: String,
    properties: HashMap<String, Value>,
    pending_changes: bool,
}

#[async_trait]
impl DocumentHandle for FakeDocumentHandle {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn property(&self, name: &str) -> Option<Value> {
        self.properties.get(name).cloned()
    }

    fn model(&self) -> Arc<dyn DataModel> {
        Arc::new(self.model.clone())
    }

    fn has_pending_changes(&self) -> bool {
        self.pending_changes
    }

    async fn reset_changes(&self) -> Result<(), TransportError> {
        let mut state = self.model.state();
        if let Some(err) = state.reset_failure.take() {
            return Err(err);
        }
        state.resets.push(self.path.clone());
        Ok(())
    }

    async fn delete(&self) -> Result<(), TransportError> {
        let mut state = self.model.state();
        if let Some(err) = state.delete_failure.take() {
            return Err(err);
        }
        state.deleted.push(self.path.clone());
        Ok(())
    }

    async fn request_object(&self, relative_path: &str) -> Result<Option<Value>, TransportError> {
        let state = self.model.state();
        let key = (self.path.clone(), relative_path.to_string());
        if let Some(err) = state.object_failures.get(&key) {
            return Err(err.clone());
        }
        Ok(state.objects.get(&key).cloned())
    }

    async fn request_canonical_path(&self) -> Result<String, TransportError> {
        let mut state = self.model.state();
        state.canonical_requests += 1;
        match state.canonical_paths.get(&self.path) {
            Some(outcome) => outcome.clone(),
            None => Err(TransportError::with_status(
                404,
                format!("no canonical path scripted for {}", self.path),
            )),
        }
    }
}

/// Builder for a fully wired fake service
#[derive(Debug, Default)]
pub struct DraftServiceBuilder {
    annotations: HashMap<String, Value>,
}

impl DraftServiceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register any annotation verbatim
    #[must_use]
    pub fn with_annotation(mut self, path: impl Into<String>, value: Value) -> Self {
        self.annotations.insert(path.into(), value);
        self
    }

    /// Declare draft actions for an entity set
    ///
    /// Action names follow the `Service.<Operation>` scheme, e.g.
    /// `Service.Edit` for [`OperationKind::Edit`].
    #[must_use]
    pub fn with_draft_actions(mut self, entity_set: &str, kinds: &[OperationKind]) -> Self {
        for kind in kinds {
            let property = kind.annotation_property();
            self.annotations.insert(
                format!("/{entity_set}@{DRAFT_ROOT_ANNOTATION}/{property}"),
                Value::String(action_name(*kind)),
            );
        }
        self
    }

    /// Declare the messages annotation for an entity set
    #[must_use]
    pub fn with_messages_path(mut self, entity_set: &str, path: &str) -> Self {
        self.annotations.insert(
            format!("/{entity_set}/@{MESSAGES_ANNOTATION}/$Path"),
            Value::String(path.to_string()),
        );
        self
    }

    /// Declare the return type of a draft action
    #[must_use]
    pub fn with_return_type(mut self, entity_set: &str, kind: OperationKind, ty: &str) -> Self {
        let property = kind.annotation_property();
        self.annotations.insert(
            format!("/{entity_set}@{DRAFT_ROOT_ANNOTATION}/{property}/$ReturnType"),
            Value::String(ty.to_string()),
        );
        self
    }

    #[must_use]
    pub fn build(self) -> FakeDraftService {
        FakeDraftService {
            model: FakeDataModel::new(FakeMetaModel::new(self.annotations)),
        }
    }
}

/// The conventional action name used by the builder for `kind`
#[must_use]
pub fn action_name(kind: OperationKind) -> String {
    let operation = kind.annotation_property().trim_end_matches("Action");
    format!("Service.{operation}")
}

/// A fake service plus handle factories
#[derive(Clone)]
pub struct FakeDraftService {
    model: FakeDataModel,
}

impl FakeDraftService {
    #[must_use]
    pub fn model(&self) -> &FakeDataModel {
        &self.model
    }

    /// Handle with explicit draft-state flags
    #[must_use]
    pub fn handle(&self, path: &str, is_active: bool, has_active: bool) -> HandleRef {
        let mut properties = HashMap::new();
        properties.insert(PROP_IS_ACTIVE_ENTITY.to_string(), Value::Bool(is_active));
        properties.insert(PROP_HAS_ACTIVE_ENTITY.to_string(), Value::Bool(has_active));
        Arc::new(FakeDocumentHandle {
            model: self.model.clone(),
            path: path.to_string(),
            properties,
            pending_changes: false,
        })
    }

    /// Handle whose draft-state flags are not loaded
    #[must_use]
    pub fn handle_without_state(&self, path: &str) -> HandleRef {
        Arc::new(FakeDocumentHandle {
            model: self.model.clone(),
            path: path.to_string(),
            properties: HashMap::new(),
            pending_changes: false,
        })
    }

    /// Handle with pending changes on its binding
    #[must_use]
    pub fn handle_with_pending_changes(
        &self,
        path: &str,
        is_active: bool,
        has_active: bool,
    ) -> HandleRef {
        let mut properties = HashMap::new();
        properties.insert(PROP_IS_ACTIVE_ENTITY.to_string(), Value::Bool(is_active));
        properties.insert(PROP_HAS_ACTIVE_ENTITY.to_string(), Value::Bool(has_active));
        Arc::new(FakeDocumentHandle {
            model: self.model.clone(),
            path: path.to_string(),
            properties,
            pending_changes: true,
        })
    }
}
