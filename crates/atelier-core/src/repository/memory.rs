//! In-memory repository implementations.
//!
//! `InMemoryItemRepository` honors the compare-and-swap contract of
//! `ItemRepository`, making it a faithful test double and a reference for
//! real storage backends. `InMemoryCatalog` serves a fixed catalog
//! snapshot's worth of definitions.

use atelier_types::error::RepositoryError;
use atelier_types::item::WorkItem;
use atelier_types::workflow::{ServicePipeline, WorkflowDefinition};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::item::{CatalogSource, ItemRepository};

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Concurrent in-memory item store keyed by item id.
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    items: DashMap<Uuid, WorkItem>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, item: &WorkItem) -> Result<(), RepositoryError> {
        if self.items.contains_key(&item.id) {
            return Err(RepositoryError::Storage(format!(
                "item {} already exists",
                item.id
            )));
        }
        self.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn get(
        &self,
        order_id: &Uuid,
        item_id: &Uuid,
    ) -> Result<Option<WorkItem>, RepositoryError> {
        Ok(self
            .items
            .get(item_id)
            .filter(|i| i.order_id == *order_id)
            .map(|i| i.value().clone()))
    }

    async fn update(
        &self,
        item: &WorkItem,
        expected_updated_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        // The entry is held for the whole compare-and-swap, so concurrent
        // writers serialize on it.
        match self.items.get_mut(&item.id) {
            Some(mut stored) => {
                if stored.last_updated_at != expected_updated_at {
                    return Err(RepositoryError::StaleWrite(format!(
                        "item {} changed at {}",
                        item.id, stored.last_updated_at
                    )));
                }
                *stored = item.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list_for_order(&self, order_id: &Uuid) -> Result<Vec<WorkItem>, RepositoryError> {
        let mut items: Vec<WorkItem> = self
            .items
            .iter()
            .filter(|i| i.order_id == *order_id)
            .map(|i| i.value().clone())
            .collect();
        items.sort_by_key(|i| i.id);
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Fixed in-memory catalog source.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    workflows: Vec<WorkflowDefinition>,
    pipelines: Vec<ServicePipeline>,
}

impl InMemoryCatalog {
    pub fn new(workflows: Vec<WorkflowDefinition>, pipelines: Vec<ServicePipeline>) -> Self {
        Self {
            workflows,
            pipelines,
        }
    }
}

impl CatalogSource for InMemoryCatalog {
    async fn workflow_catalog(&self) -> Result<Vec<WorkflowDefinition>, RepositoryError> {
        Ok(self.workflows.clone())
    }

    async fn service_pipeline(
        &self,
        service_id: &str,
    ) -> Result<Option<ServicePipeline>, RepositoryError> {
        Ok(self
            .pipelines
            .iter()
            .find(|p| p.service_id == service_id)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item() -> WorkItem {
        let now = Utc::now();
        WorkItem {
            id: Uuid::now_v7(),
            order_id: Uuid::now_v7(),
            name: "suede jacket".to_string(),
            service_ref: "full-care".to_string(),
            current_workflow_id: "wash".to_string(),
            current_stage_id: "soak".to_string(),
            history: vec![],
            created_at: now,
            last_updated_at: now,
            cancel_reason: None,
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let repo = InMemoryItemRepository::new();
        let it = item();
        repo.create(&it).await.unwrap();

        let fetched = repo.get(&it.order_id, &it.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "suede jacket");

        // Wrong order id does not expose the item.
        let missing = repo.get(&Uuid::now_v7(), &it.id).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = InMemoryItemRepository::new();
        let it = item();
        repo.create(&it).await.unwrap();
        let err = repo.create(&it).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Storage(_)));
    }

    #[tokio::test]
    async fn update_succeeds_with_matching_version() {
        let repo = InMemoryItemRepository::new();
        let it = item();
        repo.create(&it).await.unwrap();

        let mut changed = it.clone();
        changed.current_stage_id = "rinse".to_string();
        changed.last_updated_at = it.last_updated_at + Duration::seconds(5);

        repo.update(&changed, it.last_updated_at).await.unwrap();
        let fetched = repo.get(&it.order_id, &it.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_stage_id, "rinse");
    }

    #[tokio::test]
    async fn update_rejects_stale_writer() {
        let repo = InMemoryItemRepository::new();
        let it = item();
        repo.create(&it).await.unwrap();

        // Writer A lands first.
        let mut a = it.clone();
        a.current_stage_id = "rinse".to_string();
        a.last_updated_at = it.last_updated_at + Duration::seconds(5);
        repo.update(&a, it.last_updated_at).await.unwrap();

        // Writer B read the same original state and must lose.
        let mut b = it.clone();
        b.current_stage_id = "dry".to_string();
        b.last_updated_at = it.last_updated_at + Duration::seconds(6);
        let err = repo.update(&b, it.last_updated_at).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StaleWrite(_)));

        // A's write survived.
        let fetched = repo.get(&it.order_id, &it.id).await.unwrap().unwrap();
        assert_eq!(fetched.current_stage_id, "rinse");
    }

    #[tokio::test]
    async fn update_unknown_item_is_not_found() {
        let repo = InMemoryItemRepository::new();
        let it = item();
        let err = repo.update(&it, it.last_updated_at).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn list_for_order_filters_by_order() {
        let repo = InMemoryItemRepository::new();
        let a = item();
        let mut b = item();
        b.order_id = a.order_id;
        let other = item();

        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();
        repo.create(&other).await.unwrap();

        let listed = repo.list_for_order(&a.order_id).await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn catalog_source_serves_pipeline() {
        let catalog = InMemoryCatalog::new(
            vec![],
            vec![ServicePipeline {
                service_id: "full-care".to_string(),
                name: "Full Care".to_string(),
                segments: vec![],
            }],
        );
        assert!(catalog
            .service_pipeline("full-care")
            .await
            .unwrap()
            .is_some());
        assert!(catalog.service_pipeline("unknown").await.unwrap().is_none());
    }
}
