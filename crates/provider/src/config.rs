//! Layout configuration: entity types, their boxes, and guard settings.
//!
//! Loaded once at startup (JSON) and turned into a
//! [`BoxRegistry`](crate::registry::BoxRegistry); never consulted on the
//! request path directly.

use boxgate_core::error::{GuardError, GuardResult};
use boxgate_core::{EntityType, FieldId, SecurityLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What a full replacement does with unassigned fields it omits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedOnReplace {
    /// Omitted unassigned fields stay as they are.
    #[default]
    Retain,
    /// Omitted unassigned fields are deleted, like fields of a box.
    Synchronize,
}

/// Settings that apply across entity types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardSettings {
    /// Reserved field naming the item's owner.
    #[serde(default = "default_owner_field")]
    pub owner_field: FieldId,

    /// Level applied to fields no box claims.
    #[serde(default)]
    pub unassigned_level: SecurityLevel,

    #[serde(default)]
    pub unassigned_on_replace: UnassignedOnReplace,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            owner_field: default_owner_field(),
            unassigned_level: SecurityLevel::Public,
            unassigned_on_replace: UnassignedOnReplace::Retain,
        }
    }
}

fn default_owner_field() -> FieldId {
    FieldId::from("cris.owner")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(flatten)]
    pub settings: GuardSettings,

    #[serde(default)]
    pub entity_types: Vec<EntityType>,
}

impl LayoutConfig {
    pub fn from_json(json: &str) -> GuardResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GuardError::Config(format!("invalid layout config: {e}")))
    }

    pub fn from_path(path: &Path) -> GuardResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), bytes = raw.len(), "loading layout config");
        Self::from_json(&raw)
    }
}
