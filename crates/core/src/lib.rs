//! Domain models, shared types, and error definitions.
//!
//! Foundation crate -- no async or I/O dependencies.

pub mod error;
pub mod patch;
pub mod types;

pub use error::{GuardError, GuardResult};
pub use patch::{MetadataPath, MutationRequest, PatchOperation, PatchValue, Position};
pub use types::{
    AccessFacts, AccessMode, Actor, EntityType, FieldAssignment, FieldId, Item, LayoutBox,
    Metadata, MetadataValue, PrincipalKind, PrincipalRef, SecurityLevel,
};
