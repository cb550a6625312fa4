use boxgate_core::{
    AccessFacts, Actor, EntityType, Item, LayoutBox, Metadata, MetadataValue, MutationRequest,
    SecurityLevel,
};
use boxgate_engine::{authorize, filter_metadata};
use boxgate_provider::{
    BoxRegistry, ContextResolver, GuardSettings, LayoutConfig, PolicyTable, StaticDirectory,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LEVELS: [SecurityLevel; 5] = [
    SecurityLevel::Public,
    SecurityLevel::Administrator,
    SecurityLevel::OwnerOnly,
    SecurityLevel::OwnerAndAdministrator,
    SecurityLevel::CustomData,
];

struct Admin;

impl AccessFacts for Admin {
    fn is_administrator(&self) -> bool {
        true
    }
    fn is_owner(&self) -> bool {
        false
    }
    fn has_base_write_permission(&self) -> bool {
        true
    }
    fn matches_custom_list(&self, _layout_box: &LayoutBox) -> bool {
        false
    }
}

fn field(b: usize, f: usize) -> String {
    format!("bench.box{b}.field{f}")
}

/// `n_boxes` boxes cycling through every level, `fields_per_box` fields each.
fn make_registry(n_boxes: usize, fields_per_box: usize) -> BoxRegistry {
    let boxes = (0..n_boxes)
        .map(|b| {
            let level = LEVELS[b % LEVELS.len()];
            let mut layout_box = LayoutBox::new(format!("box-{b}"), level);
            if level == SecurityLevel::CustomData {
                layout_box = layout_box.with_security_field("cris.policy.eperson");
            }
            (0..fields_per_box).fold(layout_box, |lb, f| lb.with_field(field(b, f)))
        })
        .collect();

    BoxRegistry::from_config(LayoutConfig {
        settings: GuardSettings::default(),
        entity_types: vec![EntityType {
            name: "Publication".into(),
            boxes,
        }],
    })
    .unwrap()
}

fn make_item(n_boxes: usize, fields_per_box: usize, values_per_field: usize) -> Item {
    let mut item = Item::new("item-a", "Publication")
        .with_value("cris.owner", MetadataValue::new("user-a"))
        .with_value(
            "cris.policy.eperson",
            MetadataValue::new("Listed").with_authority("user-b", 600),
        );
    for b in 0..n_boxes {
        for f in 0..fields_per_box {
            for v in 0..values_per_field {
                item.metadata
                    .push(field(b, f), MetadataValue::new(format!("value {v}")));
            }
        }
    }
    item
}

// ---------------------------------------------------------------------------
// Benchmark: read filter
// ---------------------------------------------------------------------------

fn bench_filter(c: &mut Criterion) {
    let mut dir = StaticDirectory::default();
    dir.add_administrator("admin");
    dir.add_person("user-a");
    dir.add_person("user-b");
    let dir = Arc::new(dir);
    let policy = PolicyTable::new(dir.clone());
    let settings = GuardSettings::default();
    let resolver = ContextResolver::new(dir.as_ref(), &policy, &settings);
    let actor = Actor::person("user-b");

    let mut group = c.benchmark_group("filter_metadata");
    for (n_boxes, fields_per_box) in [(5, 4), (20, 10), (50, 20)] {
        let registry = make_registry(n_boxes, fields_per_box);
        let item = make_item(n_boxes, fields_per_box, 3);

        group.bench_with_input(
            BenchmarkId::new(format!("{n_boxes}boxes_{fields_per_box}fields"), n_boxes),
            &item,
            |b, item| {
                b.iter(|| {
                    let ctx = resolver.resolve(&actor, item);
                    black_box(filter_metadata(item, &registry, &ctx))
                });
            },
        );
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: full-replace authorization
// ---------------------------------------------------------------------------

fn bench_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("authorize_replace");
    for (n_boxes, fields_per_box) in [(5, 4), (20, 10), (50, 20)] {
        let registry = make_registry(n_boxes, fields_per_box);
        let item = make_item(n_boxes, fields_per_box, 3);

        // Change one field of every administrator box.
        let mut supplied: Metadata = item.metadata.clone();
        for b in (1..n_boxes).step_by(LEVELS.len()) {
            supplied.push(field(b, 0), MetadataValue::new("changed"));
        }
        let request = MutationRequest::Replace(supplied);

        group.bench_with_input(
            BenchmarkId::new(format!("{n_boxes}boxes_{fields_per_box}fields"), n_boxes),
            &request,
            |b, request| {
                b.iter(|| black_box(authorize(&item, &registry, &Admin, request).unwrap()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_filter, bench_replace);
criterion_main!(benches);
