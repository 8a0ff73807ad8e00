//! # In-Memory Store
//!
//! A [`ProducerStore`] + [`CropCatalog`] living in process memory, for tests
//! that don't need SQLite.
//!
//! ## Transaction Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin()   lock the shared state (OwnedMutexGuard), clone a working copy │
//! │  writes    apply to the working copy only                               │
//! │  commit()  replace the shared state with the working copy, unlock       │
//! │  drop      discard the working copy, unlock                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Holding the lock for the whole unit of work serializes writers the way a
//! single SQLite connection does. Constraints mirror the schema: unique
//! document, unique `(producer_id, crop_id)`, FK checks and delete cascade.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agro_core::{Area, Crop, Producer, ProducerCrop, ProducerRecord, SEED_CROPS};
use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::error::{DbError, DbResult, PRODUCER_DOCUMENT_COLUMN};
use crate::store::{
    generate_association_id, AreaField, CropCatalog, GroupCount, GroupField, ProducerStore,
    ProducerTransaction,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    producers: Vec<Producer>,
    associations: Vec<ProducerCrop>,
    crops: Vec<Crop>,
}

impl MemoryState {
    fn record(&self, id: &str) -> Option<ProducerRecord> {
        let producer = self.producers.iter().find(|p| p.id == id)?.clone();
        Some(ProducerRecord {
            associations: self.associations_of(&producer.id),
            producer,
        })
    }

    fn associations_of(&self, producer_id: &str) -> Vec<ProducerCrop> {
        let mut associations: Vec<ProducerCrop> = self
            .associations
            .iter()
            .filter(|a| a.producer_id == producer_id)
            .cloned()
            .collect();
        associations.sort_by(|a, b| a.crop.name.cmp(&b.crop.name));
        associations
    }

    fn document_taken(&self, document: &str, except_id: &str) -> bool {
        self.producers
            .iter()
            .any(|p| p.document == document && p.id != except_id)
    }
}

/// Shared in-memory store. Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_associations: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Empty store with the standard crop catalog.
    pub fn new() -> Self {
        let crops = SEED_CROPS
            .iter()
            .map(|(id, name)| Crop {
                id: id.to_string(),
                name: name.to_string(),
            })
            .collect();
        Self::with_crops(crops)
    }

    /// Empty store with a custom crop catalog.
    pub fn with_crops(crops: Vec<Crop>) -> Self {
        MemoryStore {
            state: Arc::new(Mutex::new(MemoryState {
                crops,
                ..Default::default()
            })),
            fail_associations: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes every subsequent `create_association` fail with `QueryFailed`.
    ///
    /// Lets tests drive a unit of work into an error after earlier writes.
    pub fn fail_associations(&self, fail: bool) {
        self.fail_associations.store(fail, Ordering::SeqCst);
    }

    /// Number of association rows across all producers.
    pub async fn association_count(&self) -> usize {
        self.state.lock().await.associations.len()
    }
}

#[async_trait]
impl CropCatalog for MemoryStore {
    async fn find_all(&self) -> DbResult<Vec<Crop>> {
        let mut crops = self.state.lock().await.crops.clone();
        crops.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(crops)
    }

    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Crop>> {
        let state = self.state.lock().await;
        let mut crops: Vec<Crop> = state
            .crops
            .iter()
            .filter(|crop| ids.contains(&crop.id))
            .cloned()
            .collect();
        crops.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(crops)
    }
}

#[async_trait]
impl ProducerStore for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> DbResult<MemoryTransaction> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        debug!("Memory transaction started");

        Ok(MemoryTransaction {
            guard,
            working,
            fail_associations: self.fail_associations.load(Ordering::SeqCst),
        })
    }

    async fn find_all(&self, offset: i64, limit: i64) -> DbResult<Vec<ProducerRecord>> {
        let state = self.state.lock().await;
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(state
            .producers
            .iter()
            .skip(offset)
            .take(limit)
            .map(|producer| ProducerRecord {
                producer: producer.clone(),
                associations: state.associations_of(&producer.id),
            })
            .collect())
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<ProducerRecord>> {
        Ok(self.state.lock().await.record(id))
    }

    async fn count(&self) -> DbResult<i64> {
        Ok(self.state.lock().await.producers.len() as i64)
    }

    async fn sum_field(&self, field: AreaField) -> DbResult<Area> {
        let state = self.state.lock().await;
        Ok(state.producers.iter().map(|p| field.of(p)).sum())
    }

    async fn count_grouped_by(&self, field: GroupField) -> DbResult<Vec<GroupCount>> {
        let state = self.state.lock().await;
        Ok(group_counts(state.producers.iter().map(|p| field.of(p))))
    }

    async fn count_grouped_by_crop_name(&self) -> DbResult<Vec<GroupCount>> {
        let state = self.state.lock().await;
        Ok(group_counts(
            state.associations.iter().map(|a| a.crop.name.as_str()),
        ))
    }

    async fn ping(&self) -> bool {
        true
    }
}

fn group_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<GroupCount> {
    let mut counts = std::collections::BTreeMap::<&str, i64>::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(name, count)| GroupCount {
            name: name.to_string(),
            count,
        })
        .collect()
}

// =============================================================================
// Transaction
// =============================================================================

/// Unit of work over a [`MemoryStore`]. Holds the store lock until it is
/// committed, rolled back or dropped.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_associations: bool,
}

impl std::fmt::Debug for MemoryTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransaction")
            .field("producers", &self.working.producers.len())
            .field("associations", &self.working.associations.len())
            .finish()
    }
}

#[async_trait]
impl ProducerTransaction for MemoryTransaction {
    async fn find_producer_by_id(&mut self, id: &str) -> DbResult<Option<ProducerRecord>> {
        Ok(self.working.record(id))
    }

    async fn find_producer_by_document(&mut self, document: &str) -> DbResult<Option<Producer>> {
        Ok(self
            .working
            .producers
            .iter()
            .find(|p| p.document == document)
            .cloned())
    }

    async fn create_producer(&mut self, producer: &Producer) -> DbResult<()> {
        if self.working.producers.iter().any(|p| p.id == producer.id) {
            return Err(DbError::duplicate("producers.id", &producer.id));
        }
        if self.working.document_taken(&producer.document, &producer.id) {
            return Err(DbError::duplicate(PRODUCER_DOCUMENT_COLUMN, &producer.document));
        }

        self.working.producers.push(producer.clone());
        Ok(())
    }

    async fn save_producer(&mut self, producer: &Producer) -> DbResult<()> {
        if self.working.document_taken(&producer.document, &producer.id) {
            return Err(DbError::duplicate(PRODUCER_DOCUMENT_COLUMN, &producer.document));
        }

        let stored = self
            .working
            .producers
            .iter_mut()
            .find(|p| p.id == producer.id)
            .ok_or_else(|| DbError::not_found("Producer", &producer.id))?;

        let created_at = stored.created_at;
        *stored = producer.clone();
        stored.created_at = created_at;
        Ok(())
    }

    async fn create_association(&mut self, producer_id: &str, crop: &Crop) -> DbResult<ProducerCrop> {
        if self.fail_associations {
            return Err(DbError::QueryFailed("injected association failure".to_string()));
        }

        let producer_exists = self.working.producers.iter().any(|p| p.id == producer_id);
        let stored_crop = self.working.crops.iter().find(|c| c.id == crop.id).cloned();
        let Some(stored_crop) = stored_crop.filter(|_| producer_exists) else {
            return Err(DbError::ForeignKeyViolation {
                message: "FOREIGN KEY constraint failed".to_string(),
            });
        };

        if self
            .working
            .associations
            .iter()
            .any(|a| a.producer_id == producer_id && a.crop.id == crop.id)
        {
            return Err(DbError::duplicate(
                "producer_crops.producer_id, producer_crops.crop_id",
                format!("{}/{}", producer_id, crop.id),
            ));
        }

        let association = ProducerCrop {
            id: generate_association_id(),
            producer_id: producer_id.to_string(),
            crop: stored_crop,
        };
        self.working.associations.push(association.clone());
        Ok(association)
    }

    async fn remove_associations(&mut self, association_ids: &[String]) -> DbResult<u64> {
        let before = self.working.associations.len();
        self.working
            .associations
            .retain(|a| !association_ids.contains(&a.id));
        Ok((before - self.working.associations.len()) as u64)
    }

    async fn remove_producer(&mut self, id: &str) -> DbResult<()> {
        let before = self.working.producers.len();
        self.working.producers.retain(|p| p.id != id);
        if self.working.producers.len() == before {
            return Err(DbError::not_found("Producer", id));
        }

        self.working.associations.retain(|a| a.producer_id != id);
        Ok(())
    }

    async fn commit(self) -> DbResult<()> {
        let MemoryTransaction {
            mut guard, working, ..
        } = self;
        *guard = working;
        debug!("Memory transaction committed");
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        debug!("Memory transaction rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn producer(id: &str, document: &str, state: &str) -> Producer {
        let now = Utc::now();
        Producer {
            id: id.to_string(),
            document: document.to_string(),
            producer_name: "Carlos Pereira".to_string(),
            farm_name: "Fazenda Santa Rita".to_string(),
            city: "Rio Verde".to_string(),
            state: state.to_string(),
            total_area: Area::from_hundredths(1_000),
            agricultural_area: Area::from_hundredths(600),
            vegetation_area: Area::from_hundredths(300),
            created_at: now,
            updated_at: now,
        }
    }

    fn crop(index: usize) -> Crop {
        Crop {
            id: SEED_CROPS[index].0.to_string(),
            name: SEED_CROPS[index].1.to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_and_drop() {
        let store = MemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "GO")).await.unwrap();
        tx.commit().await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_producer(&producer("p-2", "11144477735", "GO")).await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.find_by_id("p-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_constraints_mirror_schema() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "GO")).await.unwrap();

        let err = tx
            .create_producer(&producer("p-2", "52998224725", "MT"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on(PRODUCER_DOCUMENT_COLUMN));

        tx.create_association("p-1", &crop(0)).await.unwrap();
        assert!(matches!(
            tx.create_association("p-1", &crop(0)).await,
            Err(DbError::UniqueViolation { .. })
        ));
        assert!(matches!(
            tx.create_association("p-404", &crop(1)).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_producer_cascades() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "GO")).await.unwrap();
        tx.create_association("p-1", &crop(0)).await.unwrap();
        tx.create_association("p-1", &crop(1)).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.association_count().await, 2);

        let mut tx = store.begin().await.unwrap();
        tx.remove_producer("p-1").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.association_count().await, 0);
        assert_eq!(CropCatalog::find_all(&store).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_aggregates_sorted_by_key() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "MT")).await.unwrap();
        tx.create_producer(&producer("p-2", "11144477735", "GO")).await.unwrap();
        tx.create_producer(&producer("p-3", "11222333000181", "MT")).await.unwrap();
        tx.create_association("p-1", &crop(0)).await.unwrap();
        tx.create_association("p-2", &crop(0)).await.unwrap();
        tx.create_association("p-2", &crop(1)).await.unwrap();
        tx.commit().await.unwrap();

        let states = store.count_grouped_by(GroupField::State).await.unwrap();
        assert_eq!(
            states,
            vec![
                GroupCount { name: "GO".to_string(), count: 1 },
                GroupCount { name: "MT".to_string(), count: 2 },
            ]
        );

        let crops = store.count_grouped_by_crop_name().await.unwrap();
        assert_eq!(
            crops,
            vec![
                GroupCount { name: "Corn".to_string(), count: 1 },
                GroupCount { name: "Soybean".to_string(), count: 2 },
            ]
        );

        assert_eq!(
            store.sum_field(AreaField::Total).await.unwrap(),
            Area::from_hundredths(3_000)
        );
    }

    #[tokio::test]
    async fn test_paging_in_insertion_order() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "MT")).await.unwrap();
        tx.create_producer(&producer("p-2", "11144477735", "GO")).await.unwrap();
        tx.create_producer(&producer("p-3", "11222333000181", "MT")).await.unwrap();
        tx.commit().await.unwrap();

        let page = ProducerStore::find_all(&store, 1, 1).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].producer.id, "p-2");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_associations(true);

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725", "GO")).await.unwrap();
        assert!(matches!(
            tx.create_association("p-1", &crop(0)).await,
            Err(DbError::QueryFailed(_))
        ));
    }
}
