//! Security evaluator: (level, facts, box, mode) -> grant.
//!
//! Box security stands on its own. Administrators get no implicit pass on
//! OWNER_ONLY or CUSTOM_DATA boxes.

use boxgate_core::{AccessFacts, AccessMode, LayoutBox, SecurityLevel};
use boxgate_provider::BoxRegistry;

/// Label reported for fields no box claims.
pub const UNASSIGNED: &str = "<unassigned>";

/// Whether `level` lets the actor described by `facts` perform `mode`.
///
/// `layout_box` is the governing box, `None` for unassigned fields; a
/// CUSTOM_DATA level without a box has no list and grants nothing.
pub fn grant<F>(
    level: SecurityLevel,
    facts: &F,
    layout_box: Option<&LayoutBox>,
    mode: AccessMode,
) -> bool
where
    F: AccessFacts + ?Sized,
{
    match level {
        SecurityLevel::Public => match mode {
            AccessMode::Read => true,
            AccessMode::Write => facts.has_base_write_permission(),
        },
        SecurityLevel::Administrator => facts.is_administrator(),
        SecurityLevel::OwnerOnly => facts.is_owner(),
        SecurityLevel::OwnerAndAdministrator => facts.is_owner() || facts.is_administrator(),
        SecurityLevel::CustomData => layout_box.is_some_and(|b| facts.matches_custom_list(b)),
    }
}

/// Governing unit of a field: one configured box, or the unassigned bucket.
///
/// Boxes order before the unassigned bucket, in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Box(usize),
    Unassigned,
}

/// Registry view bound to one entity type.
#[derive(Clone, Copy)]
pub struct Layout<'r> {
    registry: &'r BoxRegistry,
    boxes: &'r [LayoutBox],
    entity_type: &'r str,
}

impl<'r> Layout<'r> {
    pub fn new(registry: &'r BoxRegistry, entity_type: &'r str) -> Self {
        Self {
            registry,
            boxes: registry.boxes_of(entity_type),
            entity_type,
        }
    }

    pub fn bucket_of(&self, field: &str) -> Bucket {
        self.registry
            .box_index(self.entity_type, field)
            .map_or(Bucket::Unassigned, Bucket::Box)
    }

    pub fn layout_box(&self, bucket: Bucket) -> Option<&'r LayoutBox> {
        match bucket {
            Bucket::Box(idx) => self.boxes.get(idx),
            Bucket::Unassigned => None,
        }
    }

    pub fn level(&self, bucket: Bucket) -> SecurityLevel {
        self.layout_box(bucket)
            .map_or(self.registry.settings().unassigned_level, |b| b.security)
    }

    pub fn name(&self, bucket: Bucket) -> &'r str {
        self.layout_box(bucket)
            .map_or(UNASSIGNED, |b| b.shortname.as_str())
    }

    pub fn grant<F>(&self, bucket: Bucket, facts: &F, mode: AccessMode) -> bool
    where
        F: AccessFacts + ?Sized,
    {
        grant(self.level(bucket), facts, self.layout_box(bucket), mode)
    }
}
