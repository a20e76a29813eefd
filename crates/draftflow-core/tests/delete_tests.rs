//! Routing between the declared Discard action and a plain delete.

use draftflow_core::prelude::*;
use draftflow_service::TransportError;
use draftflow_test_utils::{
    draft_service, FakeDraftService, FakeMessages, FakeSideEffects, FakeStrictHandling,
};
use std::sync::Arc;

fn app_context() -> AppContext {
    draftflow_test_utils::init_test_tracing();
    AppContext::new(
        Arc::new(FakeSideEffects::default()),
        Arc::new(FakeMessages::default()),
    )
}

fn service_with_discard() -> FakeDraftService {
    draft_service()
        .with_draft_actions(
            "Entities",
            &[
                OperationKind::Edit,
                OperationKind::Activation,
                OperationKind::Discard,
            ],
        )
        .build()
}

fn service_without_discard() -> FakeDraftService {
    draft_service()
        .with_draft_actions(
            "Entities",
            &[OperationKind::Edit, OperationKind::Activation],
        )
        .build()
}

#[tokio::test]
async fn test_active_document_is_deleted_directly() {
    let service = service_with_discard();
    let coordinator = DraftCoordinator::new();
    let active = service.handle("/Entities(1)", true, false);

    let deleted = coordinator
        .delete_draft(&active, &app_context(), false)
        .await
        .unwrap();

    assert!(deleted);
    assert_eq!(service.model().deleted_paths(), vec!["/Entities(1)".to_string()]);
    assert_eq!(service.model().operation_count(), 0);
}

#[tokio::test]
async fn test_draft_without_discard_action_is_deleted_directly() {
    let service = service_without_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle("/Entities(1)", false, true);

    let deleted = coordinator
        .delete_draft(&draft, &app_context(), false)
        .await
        .unwrap();

    assert!(deleted);
    assert_eq!(service.model().deleted_paths(), vec!["/Entities(1)".to_string()]);
    assert_eq!(service.model().operation_count(), 0);
}

#[tokio::test]
async fn test_draft_with_discard_action_goes_through_the_operation() {
    let service = service_with_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle("/Entities(1)", false, true);

    let deleted = coordinator
        .delete_draft(&draft, &app_context(), false)
        .await
        .unwrap();

    assert!(deleted);
    assert!(service.model().deleted_paths().is_empty());

    let operations = service.model().recorded_operations();
    assert_eq!(operations.len(), 1);
    assert_eq!(operations[0].request.action, "Service.Discard");
    assert!(!operations[0].had_conflict_handler);
}

#[tokio::test]
async fn test_discard_with_strict_handling_wires_the_callback() {
    let service = service_with_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle("/Entities(1)", false, true);
    let app = app_context()
        .with_strict_handling(Arc::new(FakeStrictHandling::answering(true)));

    coordinator.delete_draft(&draft, &app, true).await.unwrap();

    let operations = service.model().recorded_operations();
    assert!(operations[0].had_conflict_handler);
}

#[tokio::test]
async fn test_pending_changes_are_reset_before_the_delete() {
    let service = service_without_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle_with_pending_changes("/Entities(1)", false, true);

    coordinator
        .delete_draft(&draft, &app_context(), false)
        .await
        .unwrap();

    assert_eq!(service.model().reset_paths(), vec!["/Entities(1)".to_string()]);
    assert_eq!(service.model().deleted_paths(), vec!["/Entities(1)".to_string()]);
}

#[tokio::test]
async fn test_reset_failure_propagates_and_stops_the_delete() {
    let service = service_without_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle_with_pending_changes("/Entities(1)", false, true);
    service
        .model()
        .fail_reset(TransportError::with_status(500, "reset failed"));

    let err = coordinator
        .delete_draft(&draft, &app_context(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, DraftError::Transport(_)));
    assert!(service.model().deleted_paths().is_empty());
}

#[tokio::test]
async fn test_delete_failure_propagates() {
    let service = service_without_discard();
    let coordinator = DraftCoordinator::new();
    let draft = service.handle("/Entities(1)", false, true);
    service
        .model()
        .fail_delete(TransportError::with_status(500, "delete failed"));

    let err = coordinator
        .delete_draft(&draft, &app_context(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, DraftError::Transport(_)));
}
