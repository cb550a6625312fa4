//! Request-level entry points: load, resolve, evaluate, persist.

use crate::authorizer::{authorize, Authorized};
use crate::filter::filter_metadata;
use crate::report::LayoutReport;
use boxgate_core::error::GuardResult;
use boxgate_core::{Actor, Item, Metadata, MutationRequest};
use boxgate_provider::{
    BoxRegistry, ContextResolver, IdentityDirectory, MetadataStore, ResourcePolicy,
};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of an accepted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub version: u64,
    /// Shortnames of the boxes the mutation touched.
    pub touched: Vec<String>,
    /// The stored metadata after the mutation, filtered for the actor.
    pub visible: Metadata,
}

/// Front door for reads and writes over items guarded by layout boxes.
pub struct Gatekeeper<S, D, P> {
    registry: Arc<BoxRegistry>,
    store: S,
    directory: D,
    policy: P,
}

impl<S, D, P> Gatekeeper<S, D, P>
where
    S: MetadataStore,
    D: IdentityDirectory,
    P: ResourcePolicy,
{
    pub fn new(registry: Arc<BoxRegistry>, store: S, directory: D, policy: P) -> Self {
        Self {
            registry,
            store,
            directory,
            policy,
        }
    }

    pub fn registry(&self) -> &BoxRegistry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The item as `actor` may see it.
    pub async fn read(&self, actor: &Actor, item_id: &str) -> GuardResult<Item> {
        let mut item = self.store.load(item_id).await?;
        item.metadata = self.visible(actor, &item);
        Ok(item)
    }

    /// Authorizes `request` and persists the result.
    ///
    /// A rejected or malformed request leaves the stored item untouched.
    pub async fn mutate(
        &self,
        actor: &Actor,
        item_id: &str,
        request: &MutationRequest,
    ) -> GuardResult<MutationOutcome> {
        let started = Instant::now();
        let item = self.store.load(item_id).await?;

        let Authorized { metadata, touched } = {
            let ctx = self.resolver().resolve(actor, &item);
            authorize(&item, &self.registry, &ctx, request)?
        };

        if touched.is_empty() {
            tracing::info!(%actor, item = item_id, "mutation changes nothing");
            return Ok(MutationOutcome {
                version: item.version,
                touched,
                visible: self.visible(actor, &item),
            });
        }

        let version = self.store.persist(item_id, item.version, metadata.clone()).await?;
        let stored = Item {
            version,
            metadata,
            ..item
        };

        tracing::info!(
            %actor,
            item = item_id,
            version,
            touched = ?touched,
            elapsed_ms = started.elapsed().as_millis(),
            "mutation persisted"
        );

        Ok(MutationOutcome {
            version,
            touched,
            visible: self.visible(actor, &stored),
        })
    }

    /// Per-box read/write grants of `actor` on the item.
    pub async fn explain(&self, actor: &Actor, item_id: &str) -> GuardResult<LayoutReport> {
        let item = self.store.load(item_id).await?;
        let ctx = self.resolver().resolve(actor, &item);
        Ok(LayoutReport::build(&self.registry, actor, &item, &ctx))
    }

    fn resolver(&self) -> ContextResolver<'_> {
        ContextResolver::new(&self.directory, &self.policy, self.registry.settings())
    }

    fn visible(&self, actor: &Actor, item: &Item) -> Metadata {
        let ctx = self.resolver().resolve(actor, item);
        filter_metadata(item, &self.registry, &ctx)
    }
}
