//! Sibling path reconstruction against scripted canonical paths.

use draftflow_core::{CanonicalPathSiblingResolver, DraftError, SiblingResolver};
use draftflow_test_utils::draft_service;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_nested_sibling_path_reconstruction() {
    let service = draft_service().build();
    let model = service.model();
    model.script_canonical_path(
        "/Param(aa)/Entity(bb)/SiblingEntity",
        Ok("/Param(aa)/Entity(bb-sibling)".to_string()),
    );
    model.script_canonical_path(
        "/Param(aa)/Entity(bb)/_Nav(cc)/SiblingEntity",
        Ok("/Entity2(cc-sibling)".to_string()),
    );
    model.script_canonical_path(
        "/Param(aa)/Entity(bb)/_Nav(cc)/_SubNav(dd)/SiblingEntity",
        Ok("/Entity3(dd-sibling)".to_string()),
    );

    let root = service.handle("/Param(aa)/Entity(bb)", false, true);
    let target = service.handle("/Param(aa)/Entity(bb)/_Nav(cc)/_SubNav(dd)", false, true);

    let info = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &target)
        .await
        .unwrap()
        .expect("sibling must resolve");

    assert_eq!(
        info.target.path(),
        "/Param(aa)/Entity(bb-sibling)/_Nav(cc-sibling)/_SubNav(dd-sibling)"
    );

    // Deepest mapping first, one entry per keyed prefix.
    assert_eq!(info.path_mapping.len(), 3);
    assert_eq!(
        info.path_mapping[0].old_path,
        "/Param(aa)/Entity(bb)/_Nav(cc)/_SubNav(dd)"
    );
    assert_eq!(
        info.path_mapping[0].new_path,
        "/Param(aa)/Entity(bb-sibling)/_Nav(cc-sibling)/_SubNav(dd-sibling)"
    );
    assert_eq!(info.path_mapping[1].old_path, "/Param(aa)/Entity(bb)/_Nav(cc)");
    assert_eq!(
        info.path_mapping[1].new_path,
        "/Param(aa)/Entity(bb-sibling)/_Nav(cc-sibling)"
    );
    assert_eq!(info.path_mapping[2].old_path, "/Param(aa)/Entity(bb)");
    assert_eq!(info.path_mapping[2].new_path, "/Param(aa)/Entity(bb-sibling)");

    assert_eq!(model.canonical_request_count(), 3);
}

#[tokio::test]
async fn test_one_to_one_navigation_needs_no_canonical_request() {
    let service = draft_service().build();
    let model = service.model();
    model.script_canonical_path("/Entities(1)/SiblingEntity", Ok("/Entities(1-s)".to_string()));
    model.script_canonical_path(
        "/Entities(1)/_ToItem/_Sub(2)/SiblingEntity",
        Ok("/Subs(2-s)".to_string()),
    );

    let root = service.handle("/Entities(1)", false, true);
    let target = service.handle("/Entities(1)/_ToItem/_Sub(2)", false, true);

    let info = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &target)
        .await
        .unwrap()
        .expect("sibling must resolve");

    assert_eq!(info.target.path(), "/Entities(1-s)/_ToItem/_Sub(2-s)");
    // The keyless hop contributes no mapping and no request.
    assert_eq!(info.path_mapping.len(), 2);
    assert_eq!(model.canonical_request_count(), 2);
}

#[tokio::test]
async fn test_unsaved_draft_fast_exits_without_requests() {
    let service = draft_service().build();
    let root = service.handle("/Entities(1)", false, false);

    let info = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &root)
        .await
        .unwrap();

    assert!(info.is_none());
    assert_eq!(service.model().canonical_request_count(), 0);
}

#[tokio::test]
async fn test_foreign_target_is_a_caller_error() {
    let service = draft_service().build();
    let root = service.handle("/Entities(1)", true, false);
    let target = service.handle("/Others(2)", true, false);

    let result = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &target)
        .await;

    assert!(matches!(result, Err(DraftError::Path(_))));
    assert_eq!(service.model().canonical_request_count(), 0);
}

#[tokio::test]
async fn test_failed_canonical_request_means_no_sibling() {
    let service = draft_service().build();
    // Nothing scripted: every canonical-path request fails.
    let root = service.handle("/Entities(1)", true, false);

    let info = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &root)
        .await
        .unwrap();

    assert!(info.is_none());
    assert_eq!(service.model().canonical_request_count(), 1);
}

#[tokio::test]
async fn test_failure_at_a_nested_level_means_no_sibling() {
    let service = draft_service().build();
    let model = service.model();
    model.script_canonical_path("/Entities(1)/SiblingEntity", Ok("/Entities(1-s)".to_string()));
    // The nested level stays unscripted and fails.

    let root = service.handle("/Entities(1)", false, true);
    let target = service.handle("/Entities(1)/_Nav(2)", false, true);

    let info = CanonicalPathSiblingResolver::new()
        .compute_sibling_information(&root, &target)
        .await
        .unwrap();

    assert!(info.is_none());
}
