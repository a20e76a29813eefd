//! Fixed vocabulary of the draft protocol
//!
//! Annotation terms, navigation names, and wire property names are part of
//! the protocol contract with the server and are not configurable.

/// Annotation term carrying the draft action names on an entity set.
///
/// The per-operation action names hang below it, e.g.
/// `<metaPath>@com.sap.vocabularies.Common.v1.DraftRoot/EditAction`.
pub const DRAFT_ROOT_ANNOTATION: &str = "com.sap.vocabularies.Common.v1.DraftRoot";

/// Annotation term pointing at the message collection of an entity type.
pub const MESSAGES_ANNOTATION: &str = "com.sap.vocabularies.Common.v1.Messages";

/// Entity property distinguishing active documents from drafts.
pub const PROP_IS_ACTIVE_ENTITY: &str = "IsActiveEntity";

/// Entity property telling whether a draft has an active counterpart.
pub const PROP_HAS_ACTIVE_ENTITY: &str = "HasActiveEntity";

/// 1-to-1 navigation from a draft to its active sibling and vice versa.
pub const SIBLING_ENTITY_NAVIGATION: &str = "SiblingEntity";

/// Navigation to the administrative metadata of a draft (lock owner etc.).
pub const DRAFT_ADMINISTRATIVE_DATA: &str = "DraftAdministrativeData";

/// Parameter of the Edit action controlling whether pending changes of an
/// existing draft survive the edit.
pub const PARAM_PRESERVE_CHANGES: &str = "PreserveChanges";
