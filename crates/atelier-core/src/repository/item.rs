//! Work item and catalog port definitions.
//!
//! The engine is pure; these traits are the contract it needs from the
//! host's persistence/query layer. Updates follow an at-most-one-writer-
//! per-item discipline: `update` succeeds only when the caller's
//! `expected_updated_at` still matches the stored item, so two concurrent
//! transitions on the same item can never both land on stale state.
//!
//! Uses native async fn in traits (return-position `impl Trait`), no
//! async_trait macro.

use atelier_types::error::RepositoryError;
use atelier_types::item::WorkItem;
use atelier_types::workflow::{ServicePipeline, WorkflowDefinition};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for work item persistence.
pub trait ItemRepository: Send + Sync {
    /// Insert a newly seeded item.
    fn create(
        &self,
        item: &WorkItem,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Get an item by order and item id.
    fn get(
        &self,
        order_id: &Uuid,
        item_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<WorkItem>, RepositoryError>> + Send;

    /// Replace an item if and only if its stored `last_updated_at` still
    /// equals `expected_updated_at`.
    ///
    /// Returns `RepositoryError::StaleWrite` when the item changed since the
    /// caller read it; the caller must re-read and retry the transition.
    fn update(
        &self,
        item: &WorkItem,
        expected_updated_at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All items belonging to an order.
    fn list_for_order(
        &self,
        order_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<WorkItem>, RepositoryError>> + Send;
}

/// Read-only source of workflow and service catalog data.
///
/// Fetched fresh per transition; the engine never assumes catalog contents
/// are unchanged across calls.
pub trait CatalogSource: Send + Sync {
    /// All workflow definitions.
    fn workflow_catalog(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<WorkflowDefinition>, RepositoryError>> + Send;

    /// The pipeline for a service, if the service is known.
    fn service_pipeline(
        &self,
        service_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ServicePipeline>, RepositoryError>> + Send;
}
