//! Point semantics of elementary operations on a metadata map.
//!
//! Only called after every touched box passed the write gate, on a working
//! copy the caller throws away if any operation fails.

use boxgate_core::error::{GuardError, GuardResult};
use boxgate_core::{Metadata, MetadataPath, MetadataValue, PatchOperation, Position};

pub fn apply_operations(metadata: &mut Metadata, ops: &[PatchOperation]) -> GuardResult<()> {
    for (i, op) in ops.iter().enumerate() {
        apply_operation(metadata, op).map_err(|e| match e {
            GuardError::MalformedOperation(msg) => {
                GuardError::MalformedOperation(format!("operation {i} ({}): {msg}", op.name()))
            }
            other => other,
        })?;
    }
    Ok(())
}

pub fn apply_operation(metadata: &mut Metadata, op: &PatchOperation) -> GuardResult<()> {
    match op {
        PatchOperation::Add { path, value } => {
            let target = MetadataPath::parse(path)?;
            let values = value.clone().into_values();
            if values.is_empty() {
                return Err(malformed("add carries no value"));
            }
            insert(metadata, &target, values)
        }
        PatchOperation::Remove { path } => {
            let target = MetadataPath::parse(path)?;
            match target.position {
                Position::Whole => metadata
                    .remove(target.field.as_str())
                    .map(|_| ())
                    .ok_or_else(|| malformed(format!("no field {}", target.field))),
                Position::Index(idx) => take(metadata, &target, idx).map(|_| ()),
                Position::End => Err(malformed("remove cannot target '-'")),
            }
        }
        PatchOperation::Replace { path, value } => {
            let target = MetadataPath::parse(path)?;
            let mut values = value.clone().into_values();
            match target.position {
                Position::Whole => {
                    metadata.set(target.field, values);
                    Ok(())
                }
                Position::Index(idx) => {
                    if values.len() != 1 {
                        return Err(malformed("replace at an index takes exactly one value"));
                    }
                    let slot = values_mut(metadata, &target)?
                        .get_mut(idx)
                        .ok_or_else(|| out_of_range(&target, idx))?;
                    *slot = values.remove(0);
                    Ok(())
                }
                Position::End => Err(malformed("replace cannot target '-'")),
            }
        }
        PatchOperation::Move { from, path } => {
            let source = MetadataPath::parse(from)?;
            let target = MetadataPath::parse(path)?;
            let Position::Index(idx) = source.position else {
                return Err(malformed("move source must name an index"));
            };
            let value = take(metadata, &source, idx)?;
            insert(metadata, &target, vec![value])
        }
    }
}

/// Inserts at an index, or appends for `-` and whole-field targets.
fn insert(
    metadata: &mut Metadata,
    target: &MetadataPath,
    values: Vec<MetadataValue>,
) -> GuardResult<()> {
    let len = metadata.get(target.field.as_str()).map_or(0, <[_]>::len);
    let at = match target.position {
        Position::Whole | Position::End => len,
        Position::Index(idx) if idx <= len => idx,
        Position::Index(idx) => return Err(out_of_range(target, idx)),
    };

    if len == 0 {
        metadata.set(target.field.clone(), values);
    } else {
        values_mut(metadata, target)?.splice(at..at, values);
    }
    Ok(())
}

/// Removes and returns one value; drops the field once it is empty.
fn take(metadata: &mut Metadata, path: &MetadataPath, idx: usize) -> GuardResult<MetadataValue> {
    let values = values_mut(metadata, path)?;
    if idx >= values.len() {
        return Err(out_of_range(path, idx));
    }
    let value = values.remove(idx);
    metadata.prune(path.field.as_str());
    Ok(value)
}

fn values_mut<'m>(
    metadata: &'m mut Metadata,
    path: &MetadataPath,
) -> GuardResult<&'m mut Vec<MetadataValue>> {
    metadata
        .get_mut(path.field.as_str())
        .ok_or_else(|| malformed(format!("no field {}", path.field)))
}

fn out_of_range(path: &MetadataPath, idx: usize) -> GuardError {
    malformed(format!("index {idx} out of range for {}", path.field))
}

fn malformed(msg: impl Into<String>) -> GuardError {
    GuardError::MalformedOperation(msg.into())
}
