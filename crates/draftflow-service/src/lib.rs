//! Draftflow service boundary
//!
//! The draft lifecycle coordinator never talks HTTP itself. Everything it
//! needs from the OData stack is expressed here as opaque collaborator
//! traits:
//! - Document handles, the data model, and the metadata model
//! - The side-effects service and message handler of the hosting app
//! - User confirmation and strict-handling conflict callbacks
//! - Transport errors with their conflict classification
//!
//! Implementations live in the hosting application (or in
//! `draftflow-test-utils` for tests); this crate defines only the contract.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod boundary;
pub mod operation;
pub mod transport;
pub mod vocabulary;

pub use boundary::{
    ActionSideEffects, ConfirmationProvider, DataModel, DocumentHandle, HandleRef, MessageHandler,
    MetaModel, OverwritePrompt, SideEffectsService, StrictHandlingCallback,
    StrictHandlingCallbackRef,
};
pub use operation::{ConflictHandlingOptions, ConflictResolution, OperationKind, OperationRequest};
pub use transport::{ConflictKind, TransportError};
pub use vocabulary::{
    DRAFT_ADMINISTRATIVE_DATA, DRAFT_ROOT_ANNOTATION, MESSAGES_ANNOTATION, PARAM_PRESERVE_CHANGES,
    PROP_HAS_ACTIVE_ENTITY, PROP_IS_ACTIVE_ENTITY, SIBLING_ENTITY_NAVIGATION,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for implementing the draftflow service boundary
    pub use crate::{
        ConflictKind, DataModel, DocumentHandle, HandleRef, MetaModel, OperationKind,
        OperationRequest, TransportError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
