//! # Store Contracts
//!
//! The seams between the producer service and persistence.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Scoped Transaction Lifecycle                         │
//! │                                                                         │
//! │  let mut tx = store.begin().await?;       ← connection acquired         │
//! │       │                                                                 │
//! │       ├── tx.find_producer_by_id(..)                                    │
//! │       ├── tx.create_producer(..) / tx.save_producer(..)                 │
//! │       ├── tx.create_association(..) / tx.remove_associations(..)        │
//! │       │                                                                 │
//! │       ├── Ok path:   tx.commit().await?   ← writes visible, released    │
//! │       ├── Err path:  tx.rollback().await  ← writes discarded, released  │
//! │       └── `?` / panic: drop(tx)           ← same as rollback            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two implementations exist: [`SqliteStore`] here and
//! [`crate::memory::MemoryStore`] for tests.

use agro_core::{Area, Crop, Producer, ProducerCrop, ProducerRecord};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::crop::CropRepository;
use crate::repository::producer::{queries, ProducerRepository};

// =============================================================================
// Aggregate Selectors
// =============================================================================

/// Area column to sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaField {
    Total,
    Agricultural,
    Vegetation,
}

impl AreaField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            AreaField::Total => "total_area",
            AreaField::Agricultural => "agricultural_area",
            AreaField::Vegetation => "vegetation_area",
        }
    }

    pub(crate) fn of(self, producer: &Producer) -> Area {
        match self {
            AreaField::Total => producer.total_area,
            AreaField::Agricultural => producer.agricultural_area,
            AreaField::Vegetation => producer.vegetation_area,
        }
    }
}

/// Producer column to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    State,
    City,
}

impl GroupField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            GroupField::State => "state",
            GroupField::City => "city",
        }
    }

    pub(crate) fn of(self, producer: &Producer) -> &str {
        match self {
            GroupField::State => &producer.state,
            GroupField::City => &producer.city,
        }
    }
}

/// One bucket of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct GroupCount {
    pub name: String,
    pub count: i64,
}

// =============================================================================
// Traits
// =============================================================================

/// Read access to the crop vocabulary.
#[async_trait]
pub trait CropCatalog: Send + Sync {
    /// Every crop, sorted by name.
    async fn find_all(&self) -> DbResult<Vec<Crop>>;

    /// Exactly the existing subset of `ids`; missing ids are not an error.
    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Crop>>;
}

/// Producer persistence: pooled reads plus [`ProducerTransaction`]s for writes.
#[async_trait]
pub trait ProducerStore: Send + Sync {
    type Tx: ProducerTransaction + 'static;

    /// Opens a unit of work.
    async fn begin(&self) -> DbResult<Self::Tx>;

    /// One page in insertion order, crops attached.
    async fn find_all(&self, offset: i64, limit: i64) -> DbResult<Vec<ProducerRecord>>;

    async fn find_by_id(&self, id: &str) -> DbResult<Option<ProducerRecord>>;

    async fn count(&self) -> DbResult<i64>;

    /// Sum of one area column; zero on an empty store.
    async fn sum_field(&self, field: AreaField) -> DbResult<Area>;

    /// Producer counts per distinct column value, sorted by value.
    async fn count_grouped_by(&self, field: GroupField) -> DbResult<Vec<GroupCount>>;

    /// Association counts per crop name, sorted by name.
    async fn count_grouped_by_crop_name(&self) -> DbResult<Vec<GroupCount>>;

    /// True when the backing storage answers.
    async fn ping(&self) -> bool;
}

/// A unit of work. Dropping it without [`commit`](Self::commit) discards
/// every write made through it.
#[async_trait]
pub trait ProducerTransaction: Send {
    async fn find_producer_by_id(&mut self, id: &str) -> DbResult<Option<ProducerRecord>>;

    async fn find_producer_by_document(&mut self, document: &str) -> DbResult<Option<Producer>>;

    async fn create_producer(&mut self, producer: &Producer) -> DbResult<()>;

    /// Overwrites the stored row with `producer`. `NotFound` if absent.
    async fn save_producer(&mut self, producer: &Producer) -> DbResult<()>;

    /// Associates `crop` with the producer and returns the new row.
    async fn create_association(&mut self, producer_id: &str, crop: &Crop) -> DbResult<ProducerCrop>;

    /// Deletes associations by id; returns how many were removed.
    async fn remove_associations(&mut self, association_ids: &[String]) -> DbResult<u64>;

    /// Deletes the producer and, by cascade, its associations.
    async fn remove_producer(&mut self, id: &str) -> DbResult<()>;

    async fn commit(self) -> DbResult<()>;

    async fn rollback(self) -> DbResult<()>;
}

/// Generates an association id.
pub(crate) fn generate_association_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// SQLite
// =============================================================================

/// [`ProducerStore`] and [`CropCatalog`] over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    producers: ProducerRepository,
    crops: CropRepository,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore {
            producers: ProducerRepository::new(pool.clone()),
            crops: CropRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CropCatalog for SqliteStore {
    async fn find_all(&self) -> DbResult<Vec<Crop>> {
        self.crops.find_all().await
    }

    async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Crop>> {
        self.crops.find_by_ids(ids).await
    }
}

#[async_trait]
impl ProducerStore for SqliteStore {
    type Tx = SqliteTransaction;

    async fn begin(&self) -> DbResult<SqliteTransaction> {
        // Every unit of work reads before it writes. A deferred transaction
        // would fail its lock upgrade with SQLITE_BUSY under concurrent writers.
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(DbError::transaction)?;
        debug!("Transaction started");
        Ok(SqliteTransaction { tx })
    }

    async fn find_all(&self, offset: i64, limit: i64) -> DbResult<Vec<ProducerRecord>> {
        self.producers.list(offset, limit).await
    }

    async fn find_by_id(&self, id: &str) -> DbResult<Option<ProducerRecord>> {
        self.producers.get(id).await
    }

    async fn count(&self) -> DbResult<i64> {
        self.producers.count().await
    }

    async fn sum_field(&self, field: AreaField) -> DbResult<Area> {
        self.producers.sum_area(field).await
    }

    async fn count_grouped_by(&self, field: GroupField) -> DbResult<Vec<GroupCount>> {
        self.producers.count_grouped_by(field).await
    }

    async fn count_grouped_by_crop_name(&self) -> DbResult<Vec<GroupCount>> {
        self.producers.count_grouped_by_crop_name().await
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

/// A sqlx transaction. sqlx rolls back on drop, which gives release on
/// every exit path.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for SqliteTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTransaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl ProducerTransaction for SqliteTransaction {
    async fn find_producer_by_id(&mut self, id: &str) -> DbResult<Option<ProducerRecord>> {
        queries::select_record(&mut self.tx, id).await
    }

    async fn find_producer_by_document(&mut self, document: &str) -> DbResult<Option<Producer>> {
        queries::select_producer_by_document(&mut self.tx, document).await
    }

    async fn create_producer(&mut self, producer: &Producer) -> DbResult<()> {
        debug!(producer_id = %producer.id, "Inserting producer");
        queries::insert_producer(&mut self.tx, producer).await
    }

    async fn save_producer(&mut self, producer: &Producer) -> DbResult<()> {
        debug!(producer_id = %producer.id, "Updating producer");
        queries::update_producer(&mut self.tx, producer).await
    }

    async fn create_association(&mut self, producer_id: &str, crop: &Crop) -> DbResult<ProducerCrop> {
        let id = generate_association_id();
        queries::insert_association(&mut self.tx, &id, producer_id, &crop.id, Utc::now()).await?;
        debug!(producer_id, crop = %crop.name, "Association created");

        Ok(ProducerCrop {
            id,
            producer_id: producer_id.to_string(),
            crop: crop.clone(),
        })
    }

    async fn remove_associations(&mut self, association_ids: &[String]) -> DbResult<u64> {
        let removed = queries::delete_associations(&mut self.tx, association_ids).await?;
        debug!(removed, "Associations removed");
        Ok(removed)
    }

    async fn remove_producer(&mut self, id: &str) -> DbResult<()> {
        debug!(producer_id = id, "Deleting producer");
        queries::delete_producer(&mut self.tx, id).await
    }

    async fn commit(self) -> DbResult<()> {
        self.tx.commit().await.map_err(DbError::transaction)?;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> DbResult<()> {
        self.tx.rollback().await.map_err(DbError::transaction)?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use agro_core::SEED_CROPS;

    fn producer(id: &str, document: &str) -> Producer {
        let now = Utc::now();
        Producer {
            id: id.to_string(),
            document: document.to_string(),
            producer_name: "Ana Lima".to_string(),
            farm_name: "Fazenda Aurora".to_string(),
            city: "Lages".to_string(),
            state: "SC".to_string(),
            total_area: Area::from_hundredths(10_000),
            agricultural_area: Area::from_hundredths(6_000),
            vegetation_area: Area::from_hundredths(4_000),
            created_at: now,
            updated_at: now,
        }
    }

    fn soybean() -> Crop {
        Crop {
            id: SEED_CROPS[0].0.to_string(),
            name: SEED_CROPS[0].1.to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        let association = tx.create_association("p-1", &soybean()).await.unwrap();
        tx.commit().await.unwrap();

        let record = store.find_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(record.associations, vec![association]);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();

        {
            let mut tx = store.begin().await.unwrap();
            tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
            assert!(tx.find_producer_by_id("p-1").await.unwrap().is_some());
        }

        assert!(store.find_by_id("p-1").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_explicit_rollback() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        tx.rollback().await.unwrap();

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_association_rejected() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        tx.create_association("p-1", &soybean()).await.unwrap();
        let err = tx.create_association("p-1", &soybean()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_association_to_unknown_crop_rejected() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();
        let ghost = Crop {
            id: "00000000-0000-4000-8000-000000000000".to_string(),
            name: "Ghost".to_string(),
        };

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        let err = tx.create_association("p-1", &ghost).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_find_by_document_inside_transaction() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();

        let mut tx = store.begin().await.unwrap();
        tx.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        let found = tx.find_producer_by_document("52998224725").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some("p-1".to_string()));
        assert!(tx.find_producer_by_document("11144477735").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_second_writer_waits_for_first() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("agro.db")).max_connections(2))
            .await
            .unwrap();
        let store = db.store();

        let mut first = store.begin().await.unwrap();
        assert!(first.find_producer_by_document("52998224725").await.unwrap().is_none());

        let waiting = store.clone();
        let second = tokio::spawn(async move {
            let mut tx = waiting.begin().await?;
            let seen = tx.find_producer_by_document("52998224725").await?;
            let write = tx.create_producer(&producer("p-2", "52998224725")).await;
            Ok::<_, DbError>((seen.map(|p| p.id), write))
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        first.create_producer(&producer("p-1", "52998224725")).await.unwrap();
        first.commit().await.unwrap();

        let (seen, write) = second.await.unwrap().unwrap();
        assert_eq!(seen, Some("p-1".to_string()));
        assert!(write
            .unwrap_err()
            .is_unique_violation_on(crate::PRODUCER_DOCUMENT_COLUMN));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ping() {
        let store = Database::new(DbConfig::in_memory()).await.unwrap().store();
        assert!(store.ping().await);
    }
}
