//! In-memory collaborators and the JSON snapshot that seeds them.
//!
//! ```ignore
//! let backend = Snapshot::from_path(path)?.into_backend();
//! let item = backend.store.load("item-a").await?;
//! ```

use crate::{IdentityDirectory, MetadataStore, ResourcePolicy};
use async_trait::async_trait;
use boxgate_core::error::{GuardError, GuardResult};
use boxgate_core::{Actor, Item, Metadata, PrincipalKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Fixed set of people, administrators and flat groups.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    persons: HashSet<String>,
    administrators: HashSet<String>,
    /// group id -> member person ids
    groups: HashMap<String, HashSet<String>>,
}

impl StaticDirectory {
    pub fn add_person(&mut self, id: impl Into<String>) {
        self.persons.insert(id.into());
    }

    pub fn add_administrator(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.persons.insert(id.clone());
        self.administrators.insert(id);
    }

    pub fn add_group<I, S>(&mut self, id: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .entry(id.into())
            .or_default()
            .extend(members.into_iter().map(Into::into));
    }
}

impl IdentityDirectory for StaticDirectory {
    fn is_administrator(&self, person: &str) -> bool {
        self.administrators.contains(person)
    }

    fn group_memberships(&self, person: &str) -> HashSet<String> {
        self.groups
            .iter()
            .filter(|(_, members)| members.contains(person))
            .map(|(group, _)| group.clone())
            .collect()
    }

    fn principal_kind(&self, id: &str) -> Option<PrincipalKind> {
        if self.persons.contains(id) {
            Some(PrincipalKind::Person)
        } else if self.groups.contains_key(id) {
            Some(PrincipalKind::Group)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Resource policies
// ---------------------------------------------------------------------------

/// Per-item WRITE grants to persons or groups. Administrators always pass.
pub struct PolicyTable {
    directory: Arc<StaticDirectory>,
    write_grants: HashMap<String, HashSet<String>>,
}

impl PolicyTable {
    pub fn new(directory: Arc<StaticDirectory>) -> Self {
        Self {
            directory,
            write_grants: HashMap::new(),
        }
    }

    /// Grants WRITE on `item_id` to a person or group identifier.
    pub fn grant_write(&mut self, item_id: impl Into<String>, principal: impl Into<String>) {
        self.write_grants
            .entry(item_id.into())
            .or_default()
            .insert(principal.into());
    }
}

impl ResourcePolicy for PolicyTable {
    fn has_write_permission(&self, actor: &Actor, item: &Item) -> bool {
        let Some(person) = actor.id() else {
            return false;
        };
        if self.directory.is_administrator(person) {
            return true;
        }
        let Some(grantees) = self.write_grants.get(&item.id) else {
            return false;
        };
        grantees.contains(person)
            || self
                .directory
                .group_memberships(person)
                .iter()
                .any(|group| grantees.contains(group))
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Items behind one async lock; `persist` checks the version under the
/// write lock so concurrent accepted mutations cannot clobber each other.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, Item>>,
}

impl MemoryStore {
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: RwLock::new(
                items
                    .into_iter()
                    .map(|item| (item.id.clone(), item))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn load(&self, item_id: &str) -> GuardResult<Item> {
        self.items
            .read()
            .await
            .get(item_id)
            .cloned()
            .ok_or_else(|| GuardError::NotFound(format!("item {item_id}")))
    }

    async fn persist(
        &self,
        item_id: &str,
        expected_version: u64,
        metadata: Metadata,
    ) -> GuardResult<u64> {
        let mut items = self.items.write().await;
        let item = items
            .get_mut(item_id)
            .ok_or_else(|| GuardError::NotFound(format!("item {item_id}")))?;

        if item.version != expected_version {
            return Err(GuardError::Store(format!(
                "item {item_id} changed concurrently (expected version {expected_version}, found {})",
                item.version
            )));
        }

        item.metadata = metadata;
        item.version += 1;
        tracing::debug!(item = item_id, version = item.version, "persisted metadata");
        Ok(item.version)
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

/// Serialized world state for tools and tests: identities, grants, items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub persons: Vec<String>,
    #[serde(default)]
    pub administrators: Vec<String>,
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    /// item id -> person or group identifiers holding WRITE
    #[serde(default)]
    pub write_grants: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// The three collaborators built from one [`Snapshot`].
pub struct MemoryBackend {
    pub directory: Arc<StaticDirectory>,
    pub policy: PolicyTable,
    pub store: MemoryStore,
}

impl Snapshot {
    pub fn from_json(json: &str) -> GuardResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GuardError::InvalidInput(format!("invalid snapshot: {e}")))
    }

    pub fn from_path(path: &Path) -> GuardResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GuardError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn into_backend(self) -> MemoryBackend {
        let mut directory = StaticDirectory::default();
        for person in self.persons {
            directory.add_person(person);
        }
        for admin in self.administrators {
            directory.add_administrator(admin);
        }
        for group in self.groups {
            directory.add_group(group.id, group.members);
        }
        let directory = Arc::new(directory);

        let mut policy = PolicyTable::new(directory.clone());
        for (item_id, principals) in self.write_grants {
            for principal in principals {
                policy.grant_write(item_id.clone(), principal);
            }
        }

        tracing::info!(items = self.items.len(), "loaded snapshot");

        MemoryBackend {
            directory,
            policy,
            store: MemoryStore::new(self.items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxgate_core::MetadataValue;

    fn backend() -> MemoryBackend {
        Snapshot::from_json(
            r#"{
                "persons": ["eperson", "user-a", "user-b"],
                "administrators": ["admin"],
                "groups": [{"id": "group-a", "name": "Group A", "members": ["user-b"]}],
                "write_grants": {"item-a": ["eperson", "group-a"]},
                "items": [{
                    "id": "item-a",
                    "entity_type": "Publication",
                    "metadata": {"dc.title": [{"value": "Public item A"}]}
                }]
            }"#,
        )
        .unwrap()
        .into_backend()
    }

    #[test]
    fn directory_types_principals() {
        let b = backend();
        assert_eq!(b.directory.principal_kind("user-a"), Some(PrincipalKind::Person));
        assert_eq!(b.directory.principal_kind("admin"), Some(PrincipalKind::Person));
        assert_eq!(b.directory.principal_kind("group-a"), Some(PrincipalKind::Group));
        assert_eq!(b.directory.principal_kind("unknown"), None);
        assert!(b.directory.group_memberships("user-b").contains("group-a"));
    }

    #[test]
    fn write_grants_cover_persons_groups_and_admins() {
        let b = backend();
        let item = Item::new("item-a", "Publication");
        let other = Item::new("item-b", "Publication");

        assert!(b.policy.has_write_permission(&Actor::person("eperson"), &item));
        assert!(b.policy.has_write_permission(&Actor::person("user-b"), &item));
        assert!(b.policy.has_write_permission(&Actor::person("admin"), &other));
        assert!(!b.policy.has_write_permission(&Actor::person("user-a"), &item));
        assert!(!b.policy.has_write_permission(&Actor::person("eperson"), &other));
        assert!(!b.policy.has_write_permission(&Actor::Anonymous, &item));
    }

    #[tokio::test]
    async fn persist_bumps_version() {
        let b = backend();
        let item = b.store.load("item-a").await.unwrap();
        assert_eq!(item.version, 0);

        let mut md = item.metadata.clone();
        md.push("dc.date.issued", MetadataValue::new("2015-06-25"));
        assert_eq!(b.store.persist("item-a", 0, md).await.unwrap(), 1);

        let reloaded = b.store.load("item-a").await.unwrap();
        assert!(reloaded.metadata.contains("dc.date.issued"));
    }

    #[tokio::test]
    async fn stale_version_writes_nothing() {
        let b = backend();
        let before = b.store.load("item-a").await.unwrap();

        let err = b.store.persist("item-a", 7, Metadata::new()).await.unwrap_err();
        assert!(matches!(err, GuardError::Store(_)));
        assert_eq!(b.store.load("item-a").await.unwrap(), before);
    }

    #[tokio::test]
    async fn missing_item_is_not_found() {
        let err = backend().store.load("nope").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
