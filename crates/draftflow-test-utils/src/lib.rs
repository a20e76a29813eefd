//! Testing utilities for the draftflow workspace
//!
//! Scripted, recording fakes for the whole service boundary. Tests build a
//! [`FakeDraftService`], script operation outcomes and canonical paths on
//! it, hand its handles to the coordinator, and assert on the recorded
//! traffic afterwards.

#![allow(missing_docs)]

mod fake_model;
mod fixtures;

pub use fake_model::{
    action_name, DraftServiceBuilder, FakeDataModel, FakeDocumentHandle, FakeDraftService,
    FakeHandleSpec, FakeMetaModel, RecordedOperation,
};
pub use fixtures::{
    init_test_tracing, FakeConfirmation, FakeMessages, FakeSideEffects, FakeStrictHandling,
};

/// Start building a fake draft service
///
/// The builder starts without any annotations; tests declare exactly the
/// draft actions and messages paths their scenario needs.
#[must_use]
pub fn draft_service() -> DraftServiceBuilder {
    DraftServiceBuilder::new()
}
