//! Layout explain report.
//!
//! For one actor and one item, lists every box of the item's entity type
//! with its level, the fields it holds on the item, and the read/write
//! grants the actor gets. Fields no box claims show up as a final row.

use crate::evaluator::{Bucket, Layout};
use boxgate_core::{AccessFacts, AccessMode, Actor, FieldId, Item, SecurityLevel};
use boxgate_provider::BoxRegistry;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LayoutReport {
    pub item_id: String,
    pub entity_type: String,
    pub actor: String,
    pub rows: Vec<BoxRow>,
}

/// One box, or the unassigned bucket.
#[derive(Debug, Clone, Serialize)]
pub struct BoxRow {
    pub shortname: String,
    pub security: SecurityLevel,
    /// Fields of the box that carry values on the item.
    pub fields: Vec<FieldId>,
    pub read: bool,
    pub write: bool,
}

impl LayoutReport {
    pub fn build<F>(registry: &BoxRegistry, actor: &Actor, item: &Item, facts: &F) -> Self
    where
        F: AccessFacts + ?Sized,
    {
        let layout = Layout::new(registry, &item.entity_type);
        let boxes = registry.boxes_of(&item.entity_type);

        let mut rows: Vec<BoxRow> = (0..boxes.len())
            .map(|idx| row(layout, Bucket::Box(idx), facts))
            .collect();
        let mut unassigned = row(layout, Bucket::Unassigned, facts);

        for field in item.metadata.fields() {
            match layout.bucket_of(field.as_str()) {
                Bucket::Box(idx) => rows[idx].fields.push(field.clone()),
                Bucket::Unassigned => unassigned.fields.push(field.clone()),
            }
        }
        if !unassigned.fields.is_empty() {
            rows.push(unassigned);
        }

        LayoutReport {
            item_id: item.id.clone(),
            entity_type: item.entity_type.clone(),
            actor: actor.to_string(),
            rows,
        }
    }

    pub fn row(&self, shortname: &str) -> Option<&BoxRow> {
        self.rows.iter().find(|r| r.shortname == shortname)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push('\n');
        out.push_str("╔══════════════════════════════════════════════════════════════╗\n");
        out.push_str("║                    BOXGATE LAYOUT REPORT                     ║\n");
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");
        out.push_str(&format!("║  Item:         {:>45} ║\n", self.item_id));
        out.push_str(&format!("║  Entity type:  {:>45} ║\n", self.entity_type));
        out.push_str(&format!("║  Actor:        {:>45} ║\n", self.actor));
        out.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        if self.rows.is_empty() {
            out.push_str("║  No boxes configured for this entity type.                   ║\n");
        }

        for (i, row) in self.rows.iter().enumerate() {
            out.push_str(&format!(
                "║  {}. {} [{}]  read: {}  write: {}\n",
                i + 1,
                row.shortname,
                row.security,
                yes_no(row.read),
                yes_no(row.write),
            ));
            if row.fields.is_empty() {
                out.push_str("║     (no values on this item)\n");
            }
            for field in &row.fields {
                out.push_str(&format!("║     - {field}\n"));
            }
        }

        out.push_str("╚══════════════════════════════════════════════════════════════╝\n");
        out
    }
}

fn row<F>(layout: Layout<'_>, bucket: Bucket, facts: &F) -> BoxRow
where
    F: AccessFacts + ?Sized,
{
    BoxRow {
        shortname: layout.name(bucket).to_string(),
        security: layout.level(bucket),
        fields: Vec::new(),
        read: layout.grant(bucket, facts, AccessMode::Read),
        write: layout.grant(bucket, facts, AccessMode::Write),
    }
}

fn yes_no(granted: bool) -> &'static str {
    if granted {
        "yes"
    } else {
        "no"
    }
}
