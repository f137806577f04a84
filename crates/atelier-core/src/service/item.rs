//! Work item service.
//!
//! Orchestrates the full move cycle: read the item, fetch a fresh catalog
//! snapshot, run the pure engine computation, persist the result under the
//! optimistic-concurrency contract, and publish events. Generic over the
//! repository ports so atelier-core never depends on a storage crate.

use atelier_types::error::RepositoryError;
use atelier_types::event::ActivityLogEntry;
use atelier_types::item::WorkItem;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::catalog::{CatalogError, CatalogSnapshot};
use crate::engine::checklist::{self, ChecklistProgress};
use crate::engine::{resolver, MoveDecision, TransitionEngine, TransitionError};
use crate::event::EventBus;
use crate::repository::{CatalogSource, ItemRepository};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors surfaced by the item service.
///
/// `Repository(RepositoryError::StaleWrite)` means another writer landed
/// between this call's read and write; callers retry the whole
/// request/confirm cycle against fresh state.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("item not found")]
    ItemNotFound,

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("storage error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

// ---------------------------------------------------------------------------
// ItemService
// ---------------------------------------------------------------------------

/// Service driving work items through their pipelines.
pub struct ItemService<R: ItemRepository, C: CatalogSource> {
    repo: R,
    catalog: C,
    engine: TransitionEngine,
    events: EventBus,
}

impl<R: ItemRepository, C: CatalogSource> ItemService<R, C> {
    pub fn new(repo: R, catalog: C, engine: TransitionEngine, events: EventBus) -> Self {
        Self {
            repo,
            catalog,
            engine,
            events,
        }
    }

    /// Fetch a fresh catalog snapshot scoped to one service.
    ///
    /// Built per call; the engine must not observe catalog changes mid-
    /// computation, and must not assume stability across calls.
    async fn snapshot(&self, service_ref: &str) -> Result<CatalogSnapshot, ServiceError> {
        let workflows = self.catalog.workflow_catalog().await?;
        let pipeline = self.catalog.service_pipeline(service_ref).await?;
        Ok(CatalogSnapshot::new(
            workflows,
            pipeline.into_iter().collect(),
        )?)
    }

    async fn load(&self, order_id: &Uuid, item_id: &Uuid) -> Result<WorkItem, ServiceError> {
        self.repo
            .get(order_id, item_id)
            .await?
            .ok_or(ServiceError::ItemNotFound)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Seed a work item for a new order line and persist it.
    pub async fn seed_item(
        &self,
        order_id: Uuid,
        name: &str,
        service_ref: &str,
        actor: &str,
    ) -> Result<(WorkItem, ActivityLogEntry), ServiceError> {
        let snapshot = self.snapshot(service_ref).await?;
        let outcome = self
            .engine
            .seed_item(order_id, name, service_ref, actor, Utc::now(), &snapshot);

        self.repo.create(&outcome.updated_item).await?;
        for event in outcome.events {
            self.events.publish(event);
        }
        Ok((outcome.updated_item, outcome.log))
    }

    /// Classify a move without mutating anything (phase one of the
    /// request -> confirm protocol).
    pub async fn request_move(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        target_stage_id: &str,
    ) -> Result<MoveDecision, ServiceError> {
        let item = self.load(&order_id, &item_id).await?;
        let snapshot = self.snapshot(&item.service_ref).await?;
        Ok(self.engine.request_move(&item, target_stage_id, &snapshot)?)
    }

    /// Apply a move and persist the updated item as a single versioned
    /// write (phase two of the protocol).
    pub async fn confirm_move(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        target_stage_id: &str,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<(WorkItem, ActivityLogEntry), ServiceError> {
        let item = self.load(&order_id, &item_id).await?;
        let snapshot = self.snapshot(&item.service_ref).await?;

        let outcome = self.engine.confirm_move(
            &item,
            target_stage_id,
            actor,
            Utc::now(),
            reason,
            &snapshot,
        )?;

        // No-ops leave the item untouched; skip the write entirely.
        if outcome.updated_item.last_updated_at != item.last_updated_at {
            self.repo
                .update(&outcome.updated_item, item.last_updated_at)
                .await?;
        }

        for event in outcome.events {
            self.events.publish(event);
        }

        tracing::debug!(
            item_id = %item_id,
            action = outcome.log.action.as_str(),
            "move confirmed"
        );
        Ok((outcome.updated_item, outcome.log))
    }

    // -----------------------------------------------------------------------
    // Reporting
    // -----------------------------------------------------------------------

    /// Checklist completion of the item's current stage.
    ///
    /// Terminal items and stages without checklists report as complete.
    pub async fn stage_progress(
        &self,
        order_id: Uuid,
        item_id: Uuid,
    ) -> Result<ChecklistProgress, ServiceError> {
        let item = self.load(&order_id, &item_id).await?;
        let snapshot = self.snapshot(&item.service_ref).await?;
        let segment = resolver::resolve_segment(&item, &snapshot, self.engine.config());

        Ok(resolver::find_stage(&segment, &item.current_stage_id)
            .map(checklist::progress)
            .unwrap_or(ChecklistProgress {
                completed: 0,
                total: 0,
            }))
    }

    /// All items on an order, for board rendering.
    pub async fn items_for_order(&self, order_id: Uuid) -> Result<Vec<WorkItem>, ServiceError> {
        Ok(self.repo.list_for_order(&order_id).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
