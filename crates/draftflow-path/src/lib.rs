//! OData path algebra
//!
//! Pure string manipulation for hierarchical OData resource paths:
//! splitting a nested path into navigation segments, extracting and
//! stripping key predicates, and decomposing a segment into its navigation
//! name and key. No I/O happens here; the sibling path resolver drives
//! these functions with the canonical paths it requests.
//!
//! A path looks like `/Param(aa)/Entity(bb)/_Nav(cc)`: segments separated
//! by `/`, each optionally carrying a trailing parenthesized key predicate.
//! 1-to-1 navigations appear without a predicate.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use once_cell::sync::Lazy;
use regex::Regex;

/// Trailing key predicate of a segment or single-entity path.
///
/// `[^/]` keeps the match inside the final segment.
static KEY_PREDICATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^/]*\)$").expect("key predicate pattern is valid"));

/// A path segment decomposed into navigation name and key predicate
///
/// # Examples
/// - `_Nav(cc)` → navigation `_Nav`, predicate `(cc)`
/// - `_Sibling` → navigation `_Sibling`, no predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySegment<'a> {
    /// Navigation property (or entity set) name without its key
    pub navigation: &'a str,
    /// Trailing key predicate including the parentheses
    pub key_predicate: Option<&'a str>,
}

/// Check whether a path or segment ends in a key predicate
#[inline]
#[must_use]
pub fn has_key_predicate(path: &str) -> bool {
    path.ends_with(')')
}

/// Extract the trailing key predicate, parentheses included
#[inline]
#[must_use]
pub fn key_predicate(path: &str) -> Option<&str> {
    KEY_PREDICATE.find(path).map(|m| &path[m.start()..])
}

/// Remove the trailing key predicate, if any
#[inline]
#[must_use]
pub fn strip_key_predicate(segment: &str) -> &str {
    match KEY_PREDICATE.find(segment) {
        Some(m) => &segment[..m.start()],
        None => segment,
    }
}

/// Decompose a single segment into navigation name and key predicate
#[inline]
#[must_use]
pub fn split_entity_segment(segment: &str) -> EntitySegment<'_> {
    match KEY_PREDICATE.find(segment) {
        Some(m) => EntitySegment {
            navigation: &segment[..m.start()],
            key_predicate: Some(&segment[m.start()..]),
        },
        None => EntitySegment {
            navigation: segment,
            key_predicate: None,
        },
    }
}

/// Split a nested target path into sibling-resolution segments
///
/// The first segment is the root's own full path, kept whole so internal
/// `/` of parametrized entities survives; every following segment is a
/// single navigation step of the remainder.
///
/// # Errors
/// - [`PathError::NotDescendant`] when `target_path` does not start with
///   `root_path`; a programming error on the caller's side, not a
///   recoverable condition
/// - [`PathError::EmptySegment`] when the remainder contains `//`
pub fn split_sibling_segments(root_path: &str, target_path: &str) -> Result<Vec<String>, PathError> {
    let Some(remainder) = target_path.strip_prefix(root_path) else {
        return Err(PathError::NotDescendant {
            path: target_path.to_string(),
            root: root_path.to_string(),
        });
    };

    let mut segments = vec![root_path.to_string()];
    let remainder = remainder.strip_prefix('/').unwrap_or(remainder);
    if remainder.is_empty() {
        return Ok(segments);
    }

    for segment in remainder.split('/') {
        if segment.is_empty() {
            return Err(PathError::EmptySegment {
                path: target_path.to_string(),
            });
        }
        segments.push(segment.to_string());
    }

    Ok(segments)
}

/// Errors related to resource paths
#[derive(Debug, Clone, thiserror::Error)]
pub enum PathError {
    /// Target is not below the root path
    #[error("path '{path}' is not a descendant of '{root}'")]
    NotDescendant { path: String, root: String },

    /// Path contains an empty segment
    #[error("path '{path}' contains an empty segment")]
    EmptySegment { path: String },
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
