//! Write-path authorizer.
//!
//! Both request shapes go through the same three steps:
//!
//!   1. **Diff** -- collect the buckets (boxes, or the unassigned bucket)
//!      whose fields the request would change.
//!   2. **Gate** -- evaluate the write grant of every touched bucket. One
//!      denial rejects the whole request.
//!   3. **Apply** -- build the resulting metadata on a copy of the current
//!      map. Patches replay their operations; replacements synchronize the
//!      touched buckets with the supplied representation.
//!
//! Nothing here mutates the item. Persisting the result is the caller's job.

use crate::evaluator::{Bucket, Layout};
use crate::patch::apply_operations;
use boxgate_core::error::{GuardError, GuardResult};
use boxgate_core::{
    AccessFacts, AccessMode, FieldId, Item, Metadata, MutationRequest, PatchOperation,
};
use boxgate_provider::{BoxRegistry, UnassignedOnReplace};
use std::collections::{BTreeMap, BTreeSet};

/// An accepted mutation: the metadata to persist and the buckets it touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub metadata: Metadata,
    /// Shortnames of touched boxes, in configured order; the unassigned
    /// bucket reports as [`UNASSIGNED`](crate::evaluator::UNASSIGNED).
    pub touched: Vec<String>,
}

pub fn authorize<F>(
    item: &Item,
    registry: &BoxRegistry,
    facts: &F,
    request: &MutationRequest,
) -> GuardResult<Authorized>
where
    F: AccessFacts + ?Sized,
{
    let layout = Layout::new(registry, &item.entity_type);

    match request {
        MutationRequest::Patch(ops) => authorize_patch(item, layout, facts, ops),
        MutationRequest::Replace(supplied) => {
            let on_replace = registry.settings().unassigned_on_replace;
            authorize_replace(item, layout, facts, supplied, on_replace)
        }
    }
}

fn authorize_patch<F>(
    item: &Item,
    layout: Layout<'_>,
    facts: &F,
    ops: &[PatchOperation],
) -> GuardResult<Authorized>
where
    F: AccessFacts + ?Sized,
{
    let mut touched = BTreeSet::new();
    for op in ops {
        for path in op.paths()? {
            touched.insert(layout.bucket_of(path.field.as_str()));
        }
    }

    gate(item, layout, facts, &touched)?;

    let mut metadata = item.metadata.clone();
    apply_operations(&mut metadata, ops)?;

    tracing::info!(
        item = %item.id,
        ops = ops.len(),
        touched = touched.len(),
        "patch authorized"
    );

    Ok(Authorized {
        metadata,
        touched: names(layout, &touched),
    })
}

fn authorize_replace<F>(
    item: &Item,
    layout: Layout<'_>,
    facts: &F,
    supplied: &Metadata,
    on_replace: UnassignedOnReplace,
) -> GuardResult<Authorized>
where
    F: AccessFacts + ?Sized,
{
    let current = &item.metadata;

    // Fields taking part in the diff, each with its bucket. Supplied fields
    // always count; current-only fields count when the actor could see them,
    // since a client cannot be expected to echo what it was never shown.
    let mut readable = BTreeMap::new();
    let mut domain: BTreeMap<&FieldId, Bucket> = BTreeMap::new();

    for field in supplied.fields() {
        domain.insert(field, layout.bucket_of(field.as_str()));
    }
    for field in current.fields() {
        if domain.contains_key(field) {
            continue;
        }
        let bucket = layout.bucket_of(field.as_str());
        let counts = match bucket {
            Bucket::Unassigned => on_replace == UnassignedOnReplace::Synchronize,
            Bucket::Box(_) => *readable
                .entry(bucket)
                .or_insert_with(|| layout.grant(bucket, facts, AccessMode::Read)),
        };
        if counts {
            domain.insert(field, bucket);
        }
    }

    let touched: BTreeSet<Bucket> = domain
        .iter()
        .filter(|(field, _)| current.get(field.as_str()) != supplied.get(field.as_str()))
        .map(|(_, &bucket)| bucket)
        .collect();

    gate(item, layout, facts, &touched)?;

    let mut metadata = current.clone();
    for (field, bucket) in &domain {
        if !touched.contains(bucket) {
            continue;
        }
        match supplied.get(field.as_str()) {
            Some(values) => metadata.set((*field).clone(), values.to_vec()),
            None => {
                metadata.remove(field.as_str());
            }
        }
    }

    tracing::info!(
        item = %item.id,
        compared = domain.len(),
        touched = touched.len(),
        "replace authorized"
    );

    Ok(Authorized {
        metadata,
        touched: names(layout, &touched),
    })
}

/// Write-gates every touched bucket; reports all denied ones at once.
fn gate<F>(
    item: &Item,
    layout: Layout<'_>,
    facts: &F,
    touched: &BTreeSet<Bucket>,
) -> GuardResult<()>
where
    F: AccessFacts + ?Sized,
{
    let mut denied = Vec::new();
    for &bucket in touched {
        let granted = layout.grant(bucket, facts, AccessMode::Write);
        tracing::debug!(
            item = %item.id,
            shortname = layout.name(bucket),
            level = %layout.level(bucket),
            granted,
            "write gate"
        );
        if !granted {
            denied.push(layout.name(bucket).to_string());
        }
    }

    if denied.is_empty() {
        Ok(())
    } else {
        tracing::warn!(item = %item.id, denied = ?denied, "mutation rejected");
        Err(GuardError::AuthorizationDenied { boxes: denied })
    }
}

fn names(layout: Layout<'_>, touched: &BTreeSet<Bucket>) -> Vec<String> {
    touched
        .iter()
        .map(|&bucket| layout.name(bucket).to_string())
        .collect()
}
