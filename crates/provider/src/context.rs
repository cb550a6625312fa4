//! Access context resolution.
//!
//! Turns `(actor, item)` into the facts the evaluator needs. Role, owner
//! and base-write facts are computed eagerly; custom-list membership is
//! computed on first use per box and memoized for the request.

use crate::config::GuardSettings;
use crate::{IdentityDirectory, ResourcePolicy};
use boxgate_core::{AccessFacts, Actor, Item, LayoutBox, PrincipalKind, PrincipalRef};
use smallvec::SmallVec;
use std::cell::{OnceCell, RefCell};
use std::collections::{HashMap, HashSet};

/// Builds an [`AccessContext`] per request from the collaborators.
pub struct ContextResolver<'a> {
    directory: &'a dyn IdentityDirectory,
    policy: &'a dyn ResourcePolicy,
    settings: &'a GuardSettings,
}

impl<'a> ContextResolver<'a> {
    pub fn new(
        directory: &'a dyn IdentityDirectory,
        policy: &'a dyn ResourcePolicy,
        settings: &'a GuardSettings,
    ) -> Self {
        Self {
            directory,
            policy,
            settings,
        }
    }

    pub fn resolve(&self, actor: &'a Actor, item: &'a Item) -> AccessContext<'a> {
        let is_administrator = actor
            .id()
            .is_some_and(|id| self.directory.is_administrator(id));
        let is_owner = actor
            .id()
            .is_some_and(|id| owner_of(item, self.settings) == Some(id));
        let has_base_write_permission = self.policy.has_write_permission(actor, item);

        tracing::debug!(
            %actor,
            item = %item.id,
            is_administrator,
            is_owner,
            has_base_write_permission,
            "resolved access context"
        );

        AccessContext {
            actor,
            item,
            directory: self.directory,
            is_administrator,
            is_owner,
            has_base_write_permission,
            groups: OnceCell::new(),
            custom_hits: RefCell::new(HashMap::new()),
        }
    }
}

/// Owner identifier of `item`: the first owner value's authority, or its
/// value when it carries none.
fn owner_of<'i>(item: &'i Item, settings: &GuardSettings) -> Option<&'i str> {
    let value = item
        .metadata
        .get(settings.owner_field.as_str())?
        .first()?;
    Some(value.authority.as_deref().unwrap_or(&value.value))
}

/// The principals `layout_box` lists for `item`.
///
/// Each authority under the box's security fields is typed through the
/// directory; values without authority and unknown identifiers are skipped.
pub fn custom_access_list(
    layout_box: &LayoutBox,
    item: &Item,
    directory: &dyn IdentityDirectory,
) -> SmallVec<[PrincipalRef; 4]> {
    layout_box
        .security_fields
        .iter()
        .flat_map(|field| item.metadata.get(field.as_str()).unwrap_or_default())
        .filter_map(|value| value.authority.as_deref())
        .filter_map(|id| {
            directory.principal_kind(id).map(|kind| PrincipalRef {
                kind,
                id: id.to_string(),
            })
        })
        .collect()
}

/// Request-scoped facts about one actor and one item.
///
/// Not `Sync`: a context belongs to the request that resolved it.
pub struct AccessContext<'a> {
    actor: &'a Actor,
    item: &'a Item,
    directory: &'a dyn IdentityDirectory,
    is_administrator: bool,
    is_owner: bool,
    has_base_write_permission: bool,
    groups: OnceCell<HashSet<String>>,
    custom_hits: RefCell<HashMap<String, bool>>,
}

impl AccessContext<'_> {
    pub fn actor(&self) -> &Actor {
        self.actor
    }

    pub fn item(&self) -> &Item {
        self.item
    }

    fn groups(&self, person: &str) -> &HashSet<String> {
        self.groups
            .get_or_init(|| self.directory.group_memberships(person))
    }

    fn listed(&self, person: &str, layout_box: &LayoutBox) -> bool {
        custom_access_list(layout_box, self.item, self.directory)
            .iter()
            .any(|principal| match principal.kind {
                PrincipalKind::Person => principal.id == person,
                PrincipalKind::Group => self.groups(person).contains(&principal.id),
            })
    }
}

impl AccessFacts for AccessContext<'_> {
    fn is_administrator(&self) -> bool {
        self.is_administrator
    }

    fn is_owner(&self) -> bool {
        self.is_owner
    }

    fn has_base_write_permission(&self) -> bool {
        self.has_base_write_permission
    }

    fn matches_custom_list(&self, layout_box: &LayoutBox) -> bool {
        let Some(person) = self.actor.id() else {
            return false;
        };

        if let Some(&hit) = self.custom_hits.borrow().get(&layout_box.shortname) {
            return hit;
        }

        let hit = self.listed(person, layout_box);
        self.custom_hits
            .borrow_mut()
            .insert(layout_box.shortname.clone(), hit);
        hit
    }
}
