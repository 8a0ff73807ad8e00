//! # Producer Service
//!
//! The producer lifecycle manager.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request                                                                │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  validate (agro-core, no I/O)  ──► Validation / InvalidArea /           │
//! │     │                              InconsistentAreaFields               │
//! │     ▼                                                                   │
//! │  resolve crop ids (catalog)    ──► InvalidCropReference                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  ┌──────────── transaction ────────────┐                                │
//! │  │ load / uniqueness check / write     │──► NotFound / DuplicateDocument│
//! │  └──────────────┬──────────────────────┘    (rolled back)               │
//! │                 ▼                                                       │
//! │  commit, re-read with crops, respond                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Crops are resolved before the transaction opens. They are append-only
//! reference data, and a pool with one connection would otherwise wait on
//! itself.

use std::collections::HashSet;

use agro_core::document::normalize_document;
use agro_core::validation::{
    validate_area_consistency, validate_create_input, validate_pagination, validate_update_input,
};
use agro_core::{
    plan_crop_changes, Area, CoreError, CreateProducerInput, Crop, CropCount, DashboardData,
    LandUsage, Producer, ProducerResponse, StateCount, UpdateProducerInput,
};
use agro_db::{AreaField, CropCatalog, GroupField, ProducerStore, ProducerTransaction};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

/// Producer lifecycle over a store and a crop catalog.
///
/// Holds no mutable state of its own; every write is one unit of work on
/// the store.
#[derive(Debug, Clone)]
pub struct ProducerService<S, C> {
    store: S,
    catalog: C,
}

impl<S, C> ProducerService<S, C>
where
    S: ProducerStore,
    C: CropCatalog,
{
    pub fn new(store: S, catalog: C) -> Self {
        ProducerService { store, catalog }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Registers a producer with its crops.
    ///
    /// Nothing is persisted unless every step succeeds.
    pub async fn create(&self, mut input: CreateProducerInput) -> ServiceResult<ProducerResponse> {
        validate_create_input(&input)?;
        input.document = normalize_document(&input.document);
        let crops = self.resolve_crops(&input.crops).await?;

        let producer = input.into_producer(Uuid::new_v4().to_string(), Utc::now());

        let mut tx = self.store.begin().await?;
        match Self::insert_producer(&mut tx, &producer, &crops).await {
            Ok(()) => tx.commit().await?,
            Err(err) => {
                rollback(tx).await;
                return Err(err);
            }
        }

        info!(producer_id = %producer.id, crops = crops.len(), "Producer created");
        self.find_one(&producer.id).await
    }

    async fn insert_producer(
        tx: &mut S::Tx,
        producer: &Producer,
        crops: &[Crop],
    ) -> ServiceResult<()> {
        if tx.find_producer_by_document(&producer.document).await?.is_some() {
            return Err(CoreError::DuplicateDocument(producer.document.clone()).into());
        }

        tx.create_producer(producer)
            .await
            .map_err(|err| ServiceError::from_write(err, &producer.document))?;

        for crop in crops {
            tx.create_association(&producer.id, crop).await?;
        }
        Ok(())
    }

    /// Applies a partial update.
    ///
    /// A present crop list replaces the producer's crop set; associations of
    /// crops kept in the new list are left untouched.
    pub async fn update(
        &self,
        id: &str,
        mut input: UpdateProducerInput,
    ) -> ServiceResult<ProducerResponse> {
        validate_update_input(&input)?;
        if let Some(document) = input.document.as_mut() {
            *document = normalize_document(document);
        }

        let crops = match &input.crops {
            Some(ids) => Some(self.resolve_crops(ids).await?),
            None => None,
        };

        let mut tx = self.store.begin().await?;
        match Self::apply_update(&mut tx, id, &input, crops.as_deref()).await {
            Ok(()) => tx.commit().await?,
            Err(err) => {
                rollback(tx).await;
                return Err(err);
            }
        }

        info!(producer_id = id, "Producer updated");
        self.find_one(id).await
    }

    async fn apply_update(
        tx: &mut S::Tx,
        id: &str,
        input: &UpdateProducerInput,
        crops: Option<&[Crop]>,
    ) -> ServiceResult<()> {
        let record = tx
            .find_producer_by_id(id)
            .await?
            .ok_or_else(|| CoreError::ProducerNotFound(id.to_string()))?;

        if let Some(crops) = crops {
            let changes = plan_crop_changes(&record.associations, crops);
            debug!(
                producer_id = id,
                removed = changes.to_remove.len(),
                added = changes.to_add.len(),
                "Reconciling crops"
            );

            tx.remove_associations(&changes.to_remove).await?;
            for crop in &changes.to_add {
                tx.create_association(id, crop).await?;
            }
        }

        let mut producer = record.producer;

        if let Some(document) = &input.document {
            if *document != producer.document {
                if let Some(other) = tx.find_producer_by_document(document).await? {
                    if other.id != producer.id {
                        return Err(CoreError::DuplicateDocument(document.clone()).into());
                    }
                }
            }
        }

        input.apply_to(&mut producer, Utc::now());
        tx.save_producer(&producer)
            .await
            .map_err(|err| ServiceError::from_write(err, &producer.document))?;

        Ok(())
    }

    /// Deletes a producer; its associations go with it.
    pub async fn remove(&self, id: &str) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;

        if tx.find_producer_by_id(id).await?.is_none() {
            rollback(tx).await;
            return Err(CoreError::ProducerNotFound(id.to_string()).into());
        }

        tx.remove_producer(id).await?;
        tx.commit().await?;

        info!(producer_id = id, "Producer removed");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// One page of producers in insertion order.
    pub async fn find_all(&self, page: i64, limit: i64) -> ServiceResult<Vec<ProducerResponse>> {
        let (offset, limit) = validate_pagination(page, limit)?;
        let records = self.store.find_all(offset, limit).await?;

        debug!(page, limit, count = records.len(), "Listed producers");
        Ok(records.into_iter().map(|r| r.into_response()).collect())
    }

    pub async fn find_one(&self, id: &str) -> ServiceResult<ProducerResponse> {
        self.store
            .find_by_id(id)
            .await?
            .map(|record| record.into_response())
            .ok_or_else(|| CoreError::ProducerNotFound(id.to_string()).into())
    }

    /// Aggregates over every producer as of now.
    pub async fn get_dashboard_data(&self) -> ServiceResult<DashboardData> {
        let total_farms = self.store.count().await?;
        let total_area = self.store.sum_field(AreaField::Total).await?;
        let agricultural_area = self.store.sum_field(AreaField::Agricultural).await?;
        let vegetation_area = self.store.sum_field(AreaField::Vegetation).await?;

        let farms_by_state = self
            .store
            .count_grouped_by(GroupField::State)
            .await?
            .into_iter()
            .map(|group| StateCount {
                state: group.name,
                count: group.count,
            })
            .collect();

        let farms_by_crop = self
            .store
            .count_grouped_by_crop_name()
            .await?
            .into_iter()
            .map(|group| CropCount {
                crop: group.name,
                count: group.count,
            })
            .collect();

        Ok(DashboardData {
            total_farms,
            total_area,
            farms_by_state,
            farms_by_crop,
            land_usage: LandUsage {
                agricultural_area,
                vegetation_area,
            },
        })
    }

    /// The crop catalog, sorted by name.
    pub async fn list_crops(&self) -> ServiceResult<Vec<Crop>> {
        Ok(self.catalog.find_all().await?)
    }

    /// Checks an area triple against the consistency rule.
    pub fn validate_area_consistency(
        &self,
        total: Area,
        agricultural: Area,
        vegetation: Area,
    ) -> ServiceResult<()> {
        Ok(validate_area_consistency(total, agricultural, vegetation)?)
    }

    /// True when the store answers.
    pub async fn is_healthy(&self) -> bool {
        self.store.ping().await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolves every distinct id or fails with `InvalidCropReference`.
    async fn resolve_crops(&self, ids: &[String]) -> ServiceResult<Vec<Crop>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut distinct: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.insert(id.as_str()) {
                distinct.push(id.clone());
            }
        }

        let crops = self.catalog.find_by_ids(&distinct).await?;
        if crops.len() < distinct.len() {
            return Err(CoreError::InvalidCropReference {
                requested: distinct.len(),
                found: crops.len(),
            }
            .into());
        }

        Ok(crops)
    }
}

/// Rolls back after a failed step. The step's error is what gets reported;
/// a rollback failure is only logged since the connection is released either way.
async fn rollback<T: ProducerTransaction>(tx: T) {
    if let Err(err) = tx.rollback().await {
        warn!(error = %err, "Rollback failed");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::SEED_CROPS;
    use agro_db::MemoryStore;

    fn service() -> (ProducerService<MemoryStore, MemoryStore>, MemoryStore) {
        let store = MemoryStore::new();
        (ProducerService::new(store.clone(), store.clone()), store)
    }

    fn ha(hectares: i64) -> Area {
        Area::from_hundredths(hectares * 100)
    }

    fn input(document: &str, crops: &[usize]) -> CreateProducerInput {
        CreateProducerInput {
            document: document.to_string(),
            producer_name: "João da Silva".to_string(),
            farm_name: "Fazenda Boa Vista".to_string(),
            city: "Blumenau".to_string(),
            state: "SC".to_string(),
            total_area: ha(100),
            agricultural_area: ha(70),
            vegetation_area: ha(30),
            crops: crops.iter().map(|i| SEED_CROPS[*i].0.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_attaches_crops() {
        let (service, _) = service();
        let created = service.create(input("52998224725", &[0, 1])).await.unwrap();

        let names: Vec<&str> = created.crops.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Corn", "Soybean"]);
        assert_eq!(created.producer.created_at, created.producer.updated_at);
    }

    #[tokio::test]
    async fn test_duplicate_crop_ids_are_collapsed() {
        let (service, store) = service();
        service.create(input("52998224725", &[0, 0])).await.unwrap();
        assert_eq!(store.association_count().await, 1);
    }

    #[tokio::test]
    async fn test_association_failure_rolls_back_create() {
        let (service, store) = service();
        store.fail_associations(true);

        let err = service.create(input("52998224725", &[0])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_document_collision() {
        let (service, _) = service();
        service.create(input("52998224725", &[0])).await.unwrap();
        let second = service.create(input("11144477735", &[0])).await.unwrap();

        let err = service
            .update(
                &second.producer.id,
                UpdateProducerInput {
                    document: Some("52998224725".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::DuplicateDocument(_))
        ));

        let unchanged = service.find_one(&second.producer.id).await.unwrap();
        assert_eq!(unchanged.producer.document, "11144477735");
    }

    #[tokio::test]
    async fn test_update_to_own_document_is_allowed() {
        let (service, _) = service();
        let created = service.create(input("52998224725", &[0])).await.unwrap();

        let updated = service
            .update(
                &created.producer.id,
                UpdateProducerInput {
                    document: Some("52998224725".to_string()),
                    city: Some("Pomerode".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.producer.city, "Pomerode");
        assert!(updated.producer.updated_at >= created.producer.updated_at);
        assert_eq!(updated.producer.created_at, created.producer.created_at);
    }

    #[tokio::test]
    async fn test_remove_missing_producer() {
        let (service, _) = service();
        let err = service.remove("nope").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(CoreError::ProducerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_crops() {
        let (service, _) = service();
        let crops = service.list_crops().await.unwrap();
        assert_eq!(crops.len(), 5);
        assert_eq!(crops[0].name, "Coffee");
    }

    #[tokio::test]
    async fn test_validate_area_consistency_delegates() {
        let (service, _) = service();
        assert!(service.validate_area_consistency(ha(10), ha(5), ha(5)).is_ok());
        assert!(service.validate_area_consistency(ha(10), ha(6), ha(5)).is_err());
    }
}
