//! Sibling path resolution
//!
//! A draft and its active counterpart live under different key predicates.
//! Given a root document and a (possibly nested) target below it, this
//! resolver rebuilds the equivalent path chain on the sibling side by
//! requesting the canonical path of the `SiblingEntity` navigation for
//! every keyed prefix, concurrently, and reassembling the results in
//! segment order.

use crate::error::DraftError;
use crate::types::{PathMapping, SiblingInformation};
use async_trait::async_trait;
use draftflow_path::{has_key_predicate, key_predicate, split_sibling_segments, strip_key_predicate};
use draftflow_service::{DataModel, HandleRef, SIBLING_ENTITY_NAVIGATION};
use futures::future::try_join_all;
use std::sync::Arc;

/// Computes the sibling-side path chain for a nested document
#[async_trait]
pub trait SiblingResolver: Send + Sync {
    /// Resolve the sibling of `target` relative to `root`
    ///
    /// Resolves `Ok(None)` when no sibling exists: either known without a
    /// request (a never-saved draft) or discovered when a canonical-path
    /// request fails.
    ///
    /// # Errors
    /// [`DraftError::Path`] when `target` is not below `root`; this is a
    /// caller bug, not a "no sibling" outcome.
    async fn compute_sibling_information(
        &self,
        root: &HandleRef,
        target: &HandleRef,
    ) -> Result<Option<SiblingInformation>, DraftError>;
}

/// [`SiblingResolver`] based on canonical-path requests
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalPathSiblingResolver;

impl CanonicalPathSiblingResolver {
    /// Create a new resolver
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SiblingResolver for CanonicalPathSiblingResolver {
    async fn compute_sibling_information(
        &self,
        root: &HandleRef,
        target: &HandleRef,
    ) -> Result<Option<SiblingInformation>, DraftError> {
        let root_path = root.path();
        let target_path = target.path();
        let segments = split_sibling_segments(&root_path, &target_path)?;

        // A draft that was never activated has no sibling; skip the round
        // trips entirely.
        if target.is_active_entity() == Some(false) && target.has_active_entity() == Some(false) {
            tracing::debug!(path = %target_path, "document has no active counterpart");
            return Ok(None);
        }

        let model = root.model();

        // Fan out one canonical-path request per keyed prefix. 1-to-1
        // navigation hops carry no key and need no rewrite.
        let mut accumulated = String::new();
        let mut requests = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                accumulated.push('/');
            }
            accumulated.push_str(segment);
            if has_key_predicate(segment) {
                let sibling_handle =
                    model.bind_context(&format!("{accumulated}/{SIBLING_ENTITY_NAVIGATION}"));
                requests.push(async move { sibling_handle.request_canonical_path().await });
            }
        }

        let canonical_paths = match try_join_all(requests).await {
            Ok(paths) => paths,
            Err(err) => {
                // The sibling does not exist at some level of the chain.
                tracing::debug!(path = %target_path, error = %err, "no sibling found");
                return Ok(None);
            }
        };

        let Some(info) = reassemble(&segments, &canonical_paths, &model) else {
            tracing::warn!(path = %target_path, "canonical path without key predicate");
            return Ok(None);
        };

        Ok(Some(info))
    }
}

/// Rebuild the sibling-side chain from the resolved canonical paths.
///
/// The first keyed segment takes its canonical path verbatim; every later
/// keyed segment keeps its navigation name and adopts the key predicate of
/// its canonical path. Returns `None` when a canonical path lacks the key
/// predicate the reassembly needs.
fn reassemble(
    segments: &[String],
    canonical_paths: &[String],
    model: &Arc<dyn DataModel>,
) -> Option<SiblingInformation> {
    let mut old_path = String::new();
    let mut new_path = String::new();
    let mut path_mapping = Vec::new();
    let mut canonical = canonical_paths.iter();

    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            old_path.push('/');
            new_path.push('/');
        }
        old_path.push_str(segment);

        if has_key_predicate(segment) {
            let canonical_path = canonical.next()?;
            if index == 0 {
                new_path.push_str(canonical_path);
            } else {
                new_path.push_str(strip_key_predicate(segment));
                new_path.push_str(key_predicate(canonical_path)?);
            }
            path_mapping.push(PathMapping {
                old_path: old_path.clone(),
                new_path: new_path.clone(),
            });
        } else {
            new_path.push_str(segment);
        }
    }

    // Deepest mapping first: consumers rewrite the leaf before its
    // ancestors.
    path_mapping.reverse();

    Some(SiblingInformation {
        target: model.bind_context(&new_path),
        path_mapping,
    })
}
