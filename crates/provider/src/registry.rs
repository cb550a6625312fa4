//! Box registry: which box governs a field, per entity type.
//!
//! Built once from [`LayoutConfig`]; lookups are plain hash probes into a
//! per-entity-type `field -> box index` table.

use crate::config::{GuardSettings, LayoutConfig};
use boxgate_core::error::{GuardError, GuardResult};
use boxgate_core::{FieldId, LayoutBox, SecurityLevel};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
struct EntityLayout {
    boxes: Vec<LayoutBox>,
    by_field: HashMap<FieldId, usize>,
}

/// Read-only index of all configured boxes.
#[derive(Debug, Default)]
pub struct BoxRegistry {
    layouts: HashMap<String, EntityLayout>,
    settings: GuardSettings,
}

impl BoxRegistry {
    /// Validates the configuration and builds the field index.
    ///
    /// A field claimed by two boxes of one entity type is an error, not a
    /// precedence question.
    pub fn from_config(config: LayoutConfig) -> GuardResult<Self> {
        let mut layouts = HashMap::with_capacity(config.entity_types.len());

        for entity in config.entity_types {
            if entity.name.is_empty() {
                return Err(GuardError::Config("entity type with empty name".into()));
            }
            if layouts.contains_key(&entity.name) {
                return Err(GuardError::Config(format!(
                    "entity type {} declared twice",
                    entity.name
                )));
            }

            let mut by_field = HashMap::new();
            let mut shortnames = HashSet::new();

            for (idx, layout_box) in entity.boxes.iter().enumerate() {
                validate_box(&entity.name, layout_box)?;

                if !shortnames.insert(layout_box.shortname.as_str()) {
                    return Err(GuardError::Config(format!(
                        "{}: box {} declared twice",
                        entity.name, layout_box.shortname
                    )));
                }

                for assignment in &layout_box.fields {
                    if let Some(prev) = by_field.insert(assignment.field.clone(), idx) {
                        return Err(GuardError::Config(format!(
                            "{}: field {} assigned to both {} and {}",
                            entity.name,
                            assignment.field,
                            entity.boxes[prev].shortname,
                            layout_box.shortname
                        )));
                    }
                }
            }

            tracing::debug!(
                entity_type = %entity.name,
                boxes = entity.boxes.len(),
                fields = by_field.len(),
                "indexed layout"
            );

            layouts.insert(
                entity.name,
                EntityLayout {
                    boxes: entity.boxes,
                    by_field,
                },
            );
        }

        Ok(Self {
            layouts,
            settings: config.settings,
        })
    }

    /// The box governing `field` for `entity_type`, if any.
    pub fn resolve_box(&self, entity_type: &str, field: &str) -> Option<&LayoutBox> {
        let layout = self.layouts.get(entity_type)?;
        layout.by_field.get(field).map(|&idx| &layout.boxes[idx])
    }

    /// Position of the governing box within [`boxes_of`](Self::boxes_of).
    pub fn box_index(&self, entity_type: &str, field: &str) -> Option<usize> {
        self.layouts.get(entity_type)?.by_field.get(field).copied()
    }

    /// Boxes of `entity_type` in configured order; empty when unknown.
    pub fn boxes_of(&self, entity_type: &str) -> &[LayoutBox] {
        self.layouts
            .get(entity_type)
            .map(|layout| layout.boxes.as_slice())
            .unwrap_or(&[])
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.settings
    }
}

fn validate_box(entity_type: &str, layout_box: &LayoutBox) -> GuardResult<()> {
    if layout_box.shortname.is_empty() {
        return Err(GuardError::Config(format!(
            "{entity_type}: box with empty shortname"
        )));
    }
    if let Some(a) = layout_box.fields.iter().find(|a| a.field.as_str().is_empty()) {
        return Err(GuardError::Config(format!(
            "{entity_type}/{}: empty field identifier (label {:?})",
            layout_box.shortname, a.label
        )));
    }

    match layout_box.security {
        SecurityLevel::CustomData if layout_box.security_fields.is_empty() => {
            Err(GuardError::Config(format!(
                "{entity_type}/{}: CUSTOM_DATA box declares no security fields",
                layout_box.shortname
            )))
        }
        SecurityLevel::CustomData => Ok(()),
        level if !layout_box.security_fields.is_empty() => {
            tracing::warn!(
                entity_type,
                shortname = %layout_box.shortname,
                %level,
                "security fields ignored on non CUSTOM_DATA box"
            );
            Ok(())
        }
        _ => Ok(()),
    }
}
