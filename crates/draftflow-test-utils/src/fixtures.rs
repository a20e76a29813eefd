//! Recording fakes for the app-level collaborators

use async_trait::async_trait;
use draftflow_service::{
    ActionSideEffects, ConfirmationProvider, ConflictHandlingOptions, HandleRef, MessageHandler,
    OverwritePrompt, SideEffectsService, StrictHandlingCallback, TransportError,
};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Mutex;

/// Install a test subscriber honoring `RUST_LOG`, once per process
pub fn init_test_tracing() {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

#[derive(Default)]
struct SideEffectsState {
    declared: HashMap<String, ActionSideEffects>,
    requested_paths: Vec<Vec<String>>,
    requested_actions: Vec<ActionSideEffects>,
    request_failure: Option<TransportError>,
}

/// Recording side-effects service with declarable action side effects
#[derive(Default)]
pub struct FakeSideEffects {
    state: Mutex<SideEffectsState>,
}

impl FakeSideEffects {
    fn state(&self) -> std::sync::MutexGuard<'_, SideEffectsState> {
        self.state.lock().expect("side effects lock")
    }

    /// Declare side effects for an action name
    pub fn declare(&self, action: impl Into<String>, effects: ActionSideEffects) {
        self.state().declared.insert(action.into(), effects);
    }

    /// Make the next path request fail
    pub fn fail_next_request(&self, error: TransportError) {
        self.state().request_failure = Some(error);
    }

    /// Path lists requested so far
    #[must_use]
    pub fn requested_paths(&self) -> Vec<Vec<String>> {
        self.state().requested_paths.clone()
    }

    /// Number of action-level side-effect requests so far
    #[must_use]
    pub fn requested_action_count(&self) -> usize {
        self.state().requested_actions.len()
    }
}

#[async_trait]
impl SideEffectsService for FakeSideEffects {
    fn action_side_effects(
        &self,
        action_name: &str,
        _handle: &HandleRef,
    ) -> Option<ActionSideEffects> {
        self.state().declared.get(action_name).cloned()
    }

    async fn request_side_effects(
        &self,
        paths: &[String],
        _handle: &HandleRef,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(err) = state.request_failure.take() {
            return Err(err);
        }
        state.requested_paths.push(paths.to_vec());
        Ok(())
    }

    async fn request_side_effects_for_action(
        &self,
        effects: &ActionSideEffects,
        _handle: &HandleRef,
    ) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(err) = state.request_failure.take() {
            return Err(err);
        }
        state.requested_actions.push(effects.clone());
        Ok(())
    }
}

/// Recording message handler
#[derive(Default)]
pub struct FakeMessages {
    removed: Mutex<Vec<Option<String>>>,
}

impl FakeMessages {
    /// The `remove_transition_messages` calls recorded so far
    #[must_use]
    pub fn removed(&self) -> Vec<Option<String>> {
        self.removed.lock().expect("messages lock").clone()
    }
}

impl MessageHandler for FakeMessages {
    fn remove_transition_messages(&self, path: Option<&str>) {
        self.removed
            .lock()
            .expect("messages lock")
            .push(path.map(str::to_string));
    }
}

/// Confirmation provider with a fixed answer
pub struct FakeConfirmation {
    answer: bool,
    prompts: Mutex<Vec<OverwritePrompt>>,
}

impl FakeConfirmation {
    #[must_use]
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts the provider was asked so far
    #[must_use]
    pub fn prompts(&self) -> Vec<OverwritePrompt> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

#[async_trait]
impl ConfirmationProvider for FakeConfirmation {
    async fn confirm_overwrite(&self, prompt: &OverwritePrompt, _handle: &HandleRef) -> bool {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.clone());
        self.answer
    }
}

/// Strict-handling callback with a fixed answer
pub struct FakeStrictHandling {
    answer: bool,
    calls: Mutex<Vec<ConflictHandlingOptions>>,
}

impl FakeStrictHandling {
    #[must_use]
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Options seen by the callback so far
    #[must_use]
    pub fn calls(&self) -> Vec<ConflictHandlingOptions> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl StrictHandlingCallback for FakeStrictHandling {
    async fn on_strict_handling_failed(&self, options: &ConflictHandlingOptions) -> bool {
        self.calls
            .lock()
            .expect("calls lock")
            .push(options.clone());
        self.answer
    }
}
