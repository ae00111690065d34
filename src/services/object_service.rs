use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::{AppConfig, LayoutConfig};
use crate::events::{EventBus, QueryKey, Subscription, ViewCache};
use crate::model::{CreateObjectInput, ObjectKind, ObjectNode, ObjectPatch};
use crate::observer::{default_pipeline, MutationOutcome, ObserverContext, ObserverPipeline};
use crate::query::{build_forest, ensure_nestable, ObjectQueries, Page, TreeNode};
use crate::services::error::ServiceError;
use crate::store::ObjectStore;
use crate::views::{CreateDraft, GraphCommand, GraphInteraction, GraphView, Selection, TableFilter, TableView};

/// What a graph gesture led to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InteractionOutcome {
    Editor { node: ObjectNode },
    Draft { draft: CreateDraft },
    Deleted { removed: Vec<Uuid> },
    Updated { node: ObjectNode },
}

struct ListingCache {
    cache: Arc<ViewCache<Vec<ObjectNode>>>,
    _subscription: Subscription,
}

/// Entry point for every object operation. Mutations run through the observer
/// pipeline; reads go to the query layer directly.
pub struct ObjectService {
    store: Arc<dyn ObjectStore>,
    pipeline: ObserverPipeline,
    bus: EventBus,
    queries: ObjectQueries,
    listing: Option<ListingCache>,
    layout: LayoutConfig,
}

impl ObjectService {
    pub fn new(store: Arc<dyn ObjectStore>, config: &AppConfig) -> Self {
        Self::with_bus(store, EventBus::new(), config)
    }

    pub fn with_bus(store: Arc<dyn ObjectStore>, bus: EventBus, config: &AppConfig) -> Self {
        let listing = config.api.cache_full_listing.then(|| {
            let cache = ViewCache::new();
            let subscription = cache.attach(&bus);
            ListingCache {
                cache,
                _subscription: subscription,
            }
        });

        tracing::info!(
            "Object service ready on {} store (listing cache {})",
            store.backend(),
            if listing.is_some() { "on" } else { "off" }
        );

        Self {
            pipeline: default_pipeline(bus.clone(), config),
            queries: ObjectQueries::new(Arc::clone(&store), config.api.default_page_size, config.api.max_page_size),
            store,
            bus,
            listing,
            layout: config.layout,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn health(&self) -> Result<(), ServiceError> {
        Ok(self.store.health_check().await?)
    }

    // Mutations

    pub async fn create(&self, input: CreateObjectInput) -> Result<ObjectNode, ServiceError> {
        let ctx = ObserverContext::for_create(Arc::clone(&self.store), input);
        match self.pipeline.execute(ctx).await?.outcome {
            MutationOutcome::Created(node) => Ok(node),
            other => Err(unexpected("create", &other)),
        }
    }

    pub async fn update(&self, id: Uuid, patch: ObjectPatch) -> Result<ObjectNode, ServiceError> {
        let ctx = ObserverContext::for_update(Arc::clone(&self.store), id, patch);
        match self.pipeline.execute(ctx).await?.outcome {
            MutationOutcome::Updated { after, .. } => Ok(after),
            other => Err(unexpected("update", &other)),
        }
    }

    /// Delete a node and its whole subtree; returns every removed id, root first
    pub async fn delete(&self, id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let ctx = ObserverContext::for_delete(Arc::clone(&self.store), id);
        match self.pipeline.execute(ctx).await?.outcome {
            MutationOutcome::Deleted { removed, .. } => Ok(removed),
            other => Err(unexpected("delete", &other)),
        }
    }

    pub async fn reparent(&self, child: Uuid, parent: Uuid) -> Result<ObjectNode, ServiceError> {
        self.update(child, ObjectPatch::reparent(parent)).await
    }

    pub async fn detach(&self, child: Uuid) -> Result<ObjectNode, ServiceError> {
        self.update(child, ObjectPatch::detach()).await
    }

    /// Delete every selected node. Nodes already removed by an earlier cascade
    /// in the same batch are skipped.
    pub async fn delete_selection(&self, selection: &Selection) -> Result<Vec<Uuid>, ServiceError> {
        for id in selection.ids() {
            self.get(id).await?;
        }

        let mut removed: Vec<Uuid> = Vec::new();
        for id in selection.ids() {
            if removed.contains(&id) {
                continue;
            }
            removed.extend(self.delete(id).await?);
        }
        Ok(removed)
    }

    // Reads

    pub async fn get(&self, id: Uuid) -> Result<ObjectNode, ServiceError> {
        self.queries.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    pub async fn list_page(&self, page: Option<u32>, page_size: Option<u32>) -> Result<Page<ObjectNode>, ServiceError> {
        let pagination = self.queries.pagination(page, page_size)?;
        Ok(self.queries.list_page(pagination).await?)
    }

    pub async fn list_all(&self) -> Result<Vec<ObjectNode>, ServiceError> {
        match &self.listing {
            Some(listing) => Ok(listing
                .cache
                .get_or_try_load(QueryKey::All, || self.queries.list_all())
                .await?),
            None => Ok(self.queries.list_all().await?),
        }
    }

    pub async fn list_by_kind(&self, kind: ObjectKind) -> Result<Vec<ObjectNode>, ServiceError> {
        Ok(self.queries.list_by_kind(kind).await?)
    }

    /// Nested forest; hierarchies deeper than `MAX_NESTED_DEPTH` are refused
    pub async fn forest(&self) -> Result<Vec<TreeNode>, ServiceError> {
        let forest = build_forest(&self.list_all().await?);
        ensure_nestable(&forest)?;
        Ok(forest)
    }

    pub async fn table(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
        filter: &TableFilter,
    ) -> Result<TableView, ServiceError> {
        let page = self.list_page(page, page_size).await?;
        Ok(TableView::from_page(&page, filter))
    }

    pub async fn graph(&self) -> Result<GraphView, ServiceError> {
        Ok(GraphView::build(&self.list_all().await?, &self.layout))
    }

    /// Resolve a graph gesture against the current node set and carry it out
    pub async fn dispatch(&self, interaction: GraphInteraction) -> Result<InteractionOutcome, ServiceError> {
        let nodes = self.list_all().await?;
        let command = interaction.resolve(&nodes)?;
        tracing::debug!("Graph interaction {:?} resolved to {:?}", interaction, command);

        Ok(match command {
            GraphCommand::OpenEditor(node) => InteractionOutcome::Editor { node },
            GraphCommand::OpenCreate(draft) => InteractionOutcome::Draft { draft },
            GraphCommand::Delete(id) => InteractionOutcome::Deleted {
                removed: self.delete(id).await?,
            },
            GraphCommand::Reparent { child, parent } => InteractionOutcome::Updated {
                node: self.reparent(child, parent).await?,
            },
            GraphCommand::Detach { child } => InteractionOutcome::Updated {
                node: self.detach(child).await?,
            },
        })
    }
}

fn unexpected(operation: &str, outcome: &MutationOutcome) -> ServiceError {
    ServiceError::Internal(format!("{} produced an unexpected outcome: {:?}", operation, outcome))
}
