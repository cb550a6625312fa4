//! Mutation requests: elementary patch operations and full replacement.

use crate::error::{GuardError, GuardResult};
use crate::types::{FieldId, Metadata, MetadataValue};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

const METADATA_PREFIX: &str = "/metadata/";

/// Where inside a field's value list an operation points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The whole value list (`/metadata/dc.title`).
    Whole,
    /// One value (`/metadata/dc.title/0`).
    Index(usize),
    /// Past the last value (`/metadata/dc.title/-`).
    End,
}

/// Parsed `/metadata/<field>[/<index>|/-]` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataPath {
    pub field: FieldId,
    pub position: Position,
}

impl MetadataPath {
    pub fn parse(path: &str) -> GuardResult<Self> {
        let rest = path.strip_prefix(METADATA_PREFIX).ok_or_else(|| {
            GuardError::MalformedOperation(format!("path {path:?} does not target metadata"))
        })?;

        let (field, position) = match rest.split_once('/') {
            None => (rest, Position::Whole),
            Some((field, "-")) => (field, Position::End),
            Some((field, index)) => {
                let index = index.parse::<usize>().map_err(|_| {
                    GuardError::MalformedOperation(format!("invalid index in path {path:?}"))
                })?;
                (field, Position::Index(index))
            }
        };

        if field.is_empty() {
            return Err(GuardError::MalformedOperation(format!(
                "path {path:?} names no field"
            )));
        }

        Ok(Self {
            field: FieldId::from(field),
            position,
        })
    }
}

/// Operation value: one metadata value or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatchValue {
    Many(Vec<MetadataValue>),
    One(MetadataValue),
}

impl PatchValue {
    pub fn into_values(self) -> Vec<MetadataValue> {
        match self {
            PatchValue::Many(values) => values,
            PatchValue::One(value) => vec![value],
        }
    }
}

impl From<&str> for PatchValue {
    fn from(s: &str) -> Self {
        PatchValue::One(MetadataValue::new(s))
    }
}

/// One elementary operation, in JSON-Patch wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: PatchValue },
    Remove { path: String },
    Replace { path: String, value: PatchValue },
    Move { from: String, path: String },
}

impl PatchOperation {
    pub fn add(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self::Add {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Self::Remove { path: path.into() }
    }

    pub fn replace(path: impl Into<String>, value: impl Into<PatchValue>) -> Self {
        Self::Replace {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn move_value(from: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Move {
            from: from.into(),
            path: path.into(),
        }
    }

    /// Every metadata path the operation reads or writes, source first.
    pub fn paths(&self) -> GuardResult<SmallVec<[MetadataPath; 2]>> {
        Ok(match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. } => smallvec![MetadataPath::parse(path)?],
            PatchOperation::Move { from, path } => {
                smallvec![MetadataPath::parse(from)?, MetadataPath::parse(path)?]
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
        }
    }
}

/// A proposed change to one item's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    /// Ordered elementary operations (partial patch).
    Patch(Vec<PatchOperation>),
    /// Full metadata representation (replace).
    Replace(Metadata),
}
