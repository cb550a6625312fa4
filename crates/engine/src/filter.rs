//! Read-path filter.
//!
//! Suppression is per field: a field is shown with all of its values or
//! not at all. Pure; calling it twice on the same input gives the same map.

use crate::evaluator::{Bucket, Layout};
use boxgate_core::{AccessFacts, AccessMode, Item, Metadata};
use boxgate_provider::BoxRegistry;
use std::collections::HashMap;

/// The part of `item`'s metadata the actor may read.
pub fn filter_metadata<F>(item: &Item, registry: &BoxRegistry, facts: &F) -> Metadata
where
    F: AccessFacts + ?Sized,
{
    let layout = Layout::new(registry, &item.entity_type);
    let mut readable: HashMap<Bucket, bool> = HashMap::new();

    let visible: Metadata = item
        .metadata
        .iter()
        .filter(|(field, _)| {
            let bucket = layout.bucket_of(field.as_str());
            *readable
                .entry(bucket)
                .or_insert_with(|| layout.grant(bucket, facts, AccessMode::Read))
        })
        .map(|(field, values)| (field.clone(), values.to_vec()))
        .collect();

    tracing::debug!(
        item = %item.id,
        fields = item.metadata.len(),
        visible = visible.len(),
        "filtered metadata"
    );
    visible
}
