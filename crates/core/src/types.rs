//! Domain types for the boxgate metadata guard.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Qualified metadata field identifier, e.g. `dc.description.abstract`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FieldId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FieldId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confidence recorded when a value carries no authority decision.
pub const CONFIDENCE_UNSET: i32 = -1;

/// One value of a metadata field.
///
/// Deserializes from either a bare string or the full object form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "ValueRepr")]
pub struct MetadataValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Identifier of the entity the value points at (person, group, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    pub confidence: i32,
}

impl MetadataValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            language: None,
            authority: None,
            confidence: CONFIDENCE_UNSET,
        }
    }

    pub fn with_authority(mut self, authority: impl Into<String>, confidence: i32) -> Self {
        self.authority = Some(authority.into());
        self.confidence = confidence;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Text(String),
    Full {
        value: String,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        authority: Option<String>,
        #[serde(default = "default_confidence")]
        confidence: i32,
    },
}

fn default_confidence() -> i32 {
    CONFIDENCE_UNSET
}

impl From<ValueRepr> for MetadataValue {
    fn from(repr: ValueRepr) -> Self {
        match repr {
            ValueRepr::Text(value) => MetadataValue::new(value),
            ValueRepr::Full {
                value,
                language,
                authority,
                confidence,
            } => MetadataValue {
                value,
                language,
                authority,
                confidence,
            },
        }
    }
}

/// Field -> ordered values. Keys iterate in field order; a field is never
/// stored with an empty value list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    fields: BTreeMap<FieldId, Vec<MetadataValue>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&[MetadataValue]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Vec<MetadataValue>> {
        self.fields.get_mut(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Sets the full value list of a field. An empty list removes the field.
    pub fn set(&mut self, field: FieldId, values: Vec<MetadataValue>) {
        if values.is_empty() {
            self.fields.remove(field.as_str());
        } else {
            self.fields.insert(field, values);
        }
    }

    /// Appends one value, creating the field when absent.
    pub fn push(&mut self, field: impl Into<FieldId>, value: MetadataValue) {
        self.fields.entry(field.into()).or_default().push(value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Vec<MetadataValue>> {
        self.fields.remove(field)
    }

    /// Drops the field if a mutation left it without values.
    pub fn prune(&mut self, field: &str) {
        if self.fields.get(field).is_some_and(Vec::is_empty) {
            self.fields.remove(field);
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldId> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldId, &[MetadataValue])> {
        self.fields.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldId, Vec<MetadataValue>)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (FieldId, Vec<MetadataValue>)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (field, values) in iter {
            metadata.set(field, values);
        }
        metadata
    }
}

/// Goes through [`Metadata::set`], so `{"dc.subject": []}` yields no field.
impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = BTreeMap::<FieldId, Vec<MetadataValue>>::deserialize(deserializer)?;
        Ok(fields.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Items and actors
// ---------------------------------------------------------------------------

/// A repository item as seen by the guard.
///
/// `version` is the optimistic concurrency token of the store; the guard
/// never bumps it itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub entity_type: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Item {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            version: 0,
            metadata: Metadata::new(),
        }
    }

    pub fn with_value(mut self, field: &str, value: MetadataValue) -> Self {
        self.metadata.push(field, value);
        self
    }
}

/// Who is asking. Roles and memberships are looked up by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    Anonymous,
    Person(String),
}

impl Actor {
    pub fn person(id: impl Into<String>) -> Self {
        Self::Person(id.into())
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Actor::Anonymous => None,
            Actor::Person(id) => Some(id),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Anonymous => f.write_str("anonymous"),
            Actor::Person(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Person,
    Group,
}

/// Typed entry of a custom access list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: String,
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Access policy of a box. Closed set: evaluation matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityLevel {
    #[default]
    Public,
    Administrator,
    OwnerOnly,
    OwnerAndAdministrator,
    CustomData,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SecurityLevel::Public => "PUBLIC",
            SecurityLevel::Administrator => "ADMINISTRATOR",
            SecurityLevel::OwnerOnly => "OWNER_ONLY",
            SecurityLevel::OwnerAndAdministrator => "OWNER_AND_ADMINISTRATOR",
            SecurityLevel::CustomData => "CUSTOM_DATA",
        };
        f.write_str(s)
    }
}

/// Read or Write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Read,
    Write,
}

/// Places a metadata field in a box. Only `field` matters for access
/// decisions; the rest is presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub field: FieldId,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub rendering: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub row: u32,
    #[serde(default)]
    pub priority: u32,
}

impl FieldAssignment {
    pub fn new(field: impl Into<FieldId>) -> Self {
        Self {
            field: field.into(),
            label: None,
            rendering: None,
            style: None,
            row: 0,
            priority: 0,
        }
    }
}

/// A named group of fields sharing one security level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub shortname: String,
    #[serde(default)]
    pub header: Option<String>,
    pub security: SecurityLevel,
    /// Fields whose authorities list the principals of a CUSTOM_DATA box.
    #[serde(default)]
    pub security_fields: Vec<FieldId>,
    #[serde(default)]
    pub fields: Vec<FieldAssignment>,
}

impl LayoutBox {
    pub fn new(shortname: impl Into<String>, security: SecurityLevel) -> Self {
        Self {
            shortname: shortname.into(),
            header: None,
            security,
            security_fields: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<FieldId>) -> Self {
        self.fields.push(FieldAssignment::new(field));
        self
    }

    pub fn with_security_field(mut self, field: impl Into<FieldId>) -> Self {
        self.security_fields.push(field.into());
        self
    }

    pub fn owns(&self, field: &str) -> bool {
        self.fields.iter().any(|a| a.field.as_str() == field)
    }
}

/// A class of items and its ordered boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    #[serde(default)]
    pub boxes: Vec<LayoutBox>,
}

// ---------------------------------------------------------------------------
// Access facts
// ---------------------------------------------------------------------------

/// Per-request facts about the actor relative to one item.
///
/// Implemented by the resolved request context; the evaluator only sees
/// this trait.
pub trait AccessFacts {
    fn is_administrator(&self) -> bool;
    fn is_owner(&self) -> bool;
    fn has_base_write_permission(&self) -> bool;
    /// Whether the actor is listed, directly or through a group, in the
    /// custom access list `layout_box` derives from this item.
    fn matches_custom_list(&self, layout_box: &LayoutBox) -> bool;
}
