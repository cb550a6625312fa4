//! Layout registry, collaborator abstractions and access context resolution.

pub mod config;
pub mod context;
pub mod memory;
pub mod registry;

use async_trait::async_trait;
use boxgate_core::error::GuardResult;
use boxgate_core::{Actor, Item, Metadata, PrincipalKind};
use std::collections::HashSet;
use std::sync::Arc;

pub use config::{GuardSettings, LayoutConfig, UnassignedOnReplace};
pub use context::{custom_access_list, AccessContext, ContextResolver};
pub use memory::{MemoryBackend, MemoryStore, PolicyTable, Snapshot, StaticDirectory};
pub use registry::BoxRegistry;

/// People, groups and the administrator role.
pub trait IdentityDirectory: Send + Sync {
    fn is_administrator(&self, person: &str) -> bool;

    /// Identifiers of every group `person` belongs to.
    fn group_memberships(&self, person: &str) -> HashSet<String>;

    /// Whether `id` names a person, a group, or nothing known.
    fn principal_kind(&self, id: &str) -> Option<PrincipalKind>;
}

impl<T: IdentityDirectory + ?Sized> IdentityDirectory for Arc<T> {
    fn is_administrator(&self, person: &str) -> bool {
        (**self).is_administrator(person)
    }

    fn group_memberships(&self, person: &str) -> HashSet<String> {
        (**self).group_memberships(person)
    }

    fn principal_kind(&self, id: &str) -> Option<PrincipalKind> {
        (**self).principal_kind(id)
    }
}

/// Item-level grant/deny lists, consulted for the base WRITE right.
pub trait ResourcePolicy: Send + Sync {
    fn has_write_permission(&self, actor: &Actor, item: &Item) -> bool;
}

/// Item persistence.
///
/// `persist` is all-or-nothing: either the whole metadata map replaces the
/// stored one and the version advances, or nothing changes.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn load(&self, item_id: &str) -> GuardResult<Item>;

    /// Writes `metadata` if the stored version still equals
    /// `expected_version`; returns the new version.
    async fn persist(
        &self,
        item_id: &str,
        expected_version: u64,
        metadata: Metadata,
    ) -> GuardResult<u64>;
}
