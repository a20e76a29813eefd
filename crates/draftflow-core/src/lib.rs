//! Draftflow core - draft document lifecycle coordination
//!
//! The state machine of the OData draft programming model:
//! - Creates drafts from active documents, recovering from conflicts
//! - Validates drafts through the Preparation action
//! - Activates drafts, batching Prepare and Activate together
//! - Discards or deletes drafts, whichever way the service declares
//!
//! The coordinator holds three injected collaborators (action resolver,
//! operation invoker, and sibling path resolver) so each can be replaced
//! independently in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use draftflow_core::{AppContext, DraftCoordinator};
//!
//! # async fn example(handle: draftflow_service::HandleRef, app: AppContext)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = DraftCoordinator::new();
//!
//! let draft = coordinator
//!     .create_draft_from_active_document(&handle, &app, Default::default())
//!     .await?;
//!
//! if let Some(draft) = draft {
//!     coordinator.activate_document(&draft, &app, None).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod actions;
pub mod coordinator;
pub mod error;
pub mod invoker;
pub mod sibling;
pub mod types;

// Re-exports for convenience
pub use actions::{ActionResolver, AnnotationActionResolver};
pub use coordinator::DraftCoordinator;
pub use error::DraftError;
pub use invoker::{
    ExecuteOptions, InvocationOptions, ModelOperationInvoker, OperationInvocation,
    OperationInvoker,
};
pub use sibling::{CanonicalPathSiblingResolver, SiblingResolver};
pub use types::{
    ActionDescriptor, ActivationHooks, AppContext, CoordinatorConfig, CreateDraftParameters,
    DraftAdministrativeData, OperationReceipt, PathMapping, SiblingInformation,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the draft lifecycle coordinator
    pub use crate::{
        ActivationHooks, AppContext, CoordinatorConfig, CreateDraftParameters, DraftCoordinator,
        DraftError, OperationReceipt, SiblingInformation,
    };
    pub use draftflow_service::{ConflictKind, HandleRef, OperationKind};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
