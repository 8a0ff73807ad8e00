//! # Producer Repository
//!
//! Database operations for producers and their crop associations.
//!
//! ## Key Operations
//! - Paged listing with associations attached (two queries, no N+1)
//! - Dashboard aggregates (count, sums, grouped counts)
//! - Row-level statements in [`queries`], shared with [`crate::store::SqliteTransaction`]
//!
//! ## Loading a Page
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. SELECT ... FROM producers ORDER BY rowid LIMIT ? OFFSET ?           │
//! │         → [p1, p2, p3]                                                  │
//! │                                                                         │
//! │  2. SELECT ... FROM producer_crops JOIN crops                           │
//! │     WHERE producer_id IN (p1, p2, p3) ORDER BY crop name                │
//! │         → [(p1, Corn), (p1, Soybean), (p3, Coffee)]                     │
//! │                                                                         │
//! │  3. Group by producer_id in memory                                      │
//! │         → p1: [Corn, Soybean]   p2: []   p3: [Coffee]                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use agro_core::{Area, Producer, ProducerCrop, ProducerRecord};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::store::{AreaField, GroupCount, GroupField};

/// Repository for pooled producer reads.
#[derive(Debug, Clone)]
pub struct ProducerRepository {
    pool: SqlitePool,
}

impl ProducerRepository {
    /// Creates a new ProducerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProducerRepository { pool }
    }

    /// Lists one page of producers in insertion order, crops attached.
    pub async fn list(&self, offset: i64, limit: i64) -> DbResult<Vec<ProducerRecord>> {
        let mut conn = self.pool.acquire().await?;

        let producers = sqlx::query_as::<_, Producer>(
            r#"
            SELECT id, document, producer_name, farm_name, city, state,
                   total_area, agricultural_area, vegetation_area,
                   created_at, updated_at
            FROM producers
            ORDER BY rowid
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *conn)
        .await?;

        let ids: Vec<String> = producers.iter().map(|p| p.id.clone()).collect();
        let associations = queries::select_associations(&mut conn, &ids).await?;

        debug!(offset, limit, count = producers.len(), "Listed producers");
        Ok(attach_associations(producers, associations))
    }

    /// Gets a producer with its crops.
    pub async fn get(&self, id: &str) -> DbResult<Option<ProducerRecord>> {
        let mut conn = self.pool.acquire().await?;
        queries::select_record(&mut conn, id).await
    }

    /// Counts all producers.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM producers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sums one area column over all producers; zero when there are none.
    pub async fn sum_area(&self, field: AreaField) -> DbResult<Area> {
        let sql = format!("SELECT COALESCE(SUM({}), 0) FROM producers", field.column());
        let sum: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(Area::from_hundredths(sum))
    }

    /// Counts producers per distinct value of `field`, sorted by value.
    pub async fn count_grouped_by(&self, field: GroupField) -> DbResult<Vec<GroupCount>> {
        let column = field.column();
        let sql = format!(
            "SELECT {column} AS name, COUNT(*) AS count FROM producers GROUP BY {column} ORDER BY {column}"
        );
        let groups = sqlx::query_as::<_, GroupCount>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    /// Counts associations per crop name, sorted by name.
    ///
    /// Crops nobody grows are absent, not zero.
    pub async fn count_grouped_by_crop_name(&self) -> DbResult<Vec<GroupCount>> {
        let groups = sqlx::query_as::<_, GroupCount>(
            r#"
            SELECT c.name AS name, COUNT(pc.id) AS count
            FROM producer_crops pc
            INNER JOIN crops c ON c.id = pc.crop_id
            GROUP BY c.name
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }
}

/// Groups association rows under their producers, keeping producer order.
pub(crate) fn attach_associations(
    producers: Vec<Producer>,
    associations: Vec<ProducerCrop>,
) -> Vec<ProducerRecord> {
    let mut by_producer: HashMap<String, Vec<ProducerCrop>> = HashMap::new();
    for association in associations {
        by_producer
            .entry(association.producer_id.clone())
            .or_default()
            .push(association);
    }

    producers
        .into_iter()
        .map(|producer| {
            let associations = by_producer.remove(&producer.id).unwrap_or_default();
            ProducerRecord {
                producer,
                associations,
            }
        })
        .collect()
}

// =============================================================================
// Row-Level Statements
// =============================================================================

/// Statements that run on a single connection, pooled or transactional.
pub mod queries {
    use agro_core::{Crop, Producer, ProducerCrop, ProducerRecord};
    use chrono::{DateTime, Utc};
    use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

    use crate::error::{DbError, DbResult};

    #[derive(FromRow)]
    struct AssociationRow {
        id: String,
        producer_id: String,
        crop_id: String,
        crop_name: String,
    }

    impl From<AssociationRow> for ProducerCrop {
        fn from(row: AssociationRow) -> Self {
            ProducerCrop {
                id: row.id,
                producer_id: row.producer_id,
                crop: Crop {
                    id: row.crop_id,
                    name: row.crop_name,
                },
            }
        }
    }

    pub async fn select_producer(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Producer>> {
        let producer = sqlx::query_as::<_, Producer>(
            r#"
            SELECT id, document, producer_name, farm_name, city, state,
                   total_area, agricultural_area, vegetation_area,
                   created_at, updated_at
            FROM producers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(producer)
    }

    pub async fn select_producer_by_document(
        conn: &mut SqliteConnection,
        document: &str,
    ) -> DbResult<Option<Producer>> {
        let producer = sqlx::query_as::<_, Producer>(
            r#"
            SELECT id, document, producer_name, farm_name, city, state,
                   total_area, agricultural_area, vegetation_area,
                   created_at, updated_at
            FROM producers
            WHERE document = ?1
            "#,
        )
        .bind(document)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(producer)
    }

    /// Associations of the given producers, crops resolved, sorted by crop name.
    pub async fn select_associations(
        conn: &mut SqliteConnection,
        producer_ids: &[String],
    ) -> DbResult<Vec<ProducerCrop>> {
        if producer_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT pc.id AS id, pc.producer_id AS producer_id, c.id AS crop_id, c.name AS crop_name \
             FROM producer_crops pc INNER JOIN crops c ON c.id = pc.crop_id \
             WHERE pc.producer_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in producer_ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY c.name");

        let rows = builder
            .build_query_as::<AssociationRow>()
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.into_iter().map(ProducerCrop::from).collect())
    }

    /// A producer and its associations.
    pub async fn select_record(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<ProducerRecord>> {
        let Some(producer) = select_producer(&mut *conn, id).await? else {
            return Ok(None);
        };

        let associations = select_associations(&mut *conn, &[producer.id.clone()]).await?;
        Ok(Some(ProducerRecord {
            producer,
            associations,
        }))
    }

    pub async fn insert_producer(conn: &mut SqliteConnection, producer: &Producer) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO producers (
                id, document, producer_name, farm_name, city, state,
                total_area, agricultural_area, vegetation_area,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&producer.id)
        .bind(&producer.document)
        .bind(&producer.producer_name)
        .bind(&producer.farm_name)
        .bind(&producer.city)
        .bind(&producer.state)
        .bind(producer.total_area)
        .bind(producer.agricultural_area)
        .bind(producer.vegetation_area)
        .bind(producer.created_at)
        .bind(producer.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Writes every mutable column. `created_at` is never rewritten.
    pub async fn update_producer(conn: &mut SqliteConnection, producer: &Producer) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE producers SET
                document = ?2,
                producer_name = ?3,
                farm_name = ?4,
                city = ?5,
                state = ?6,
                total_area = ?7,
                agricultural_area = ?8,
                vegetation_area = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&producer.id)
        .bind(&producer.document)
        .bind(&producer.producer_name)
        .bind(&producer.farm_name)
        .bind(&producer.city)
        .bind(&producer.state)
        .bind(producer.total_area)
        .bind(producer.agricultural_area)
        .bind(producer.vegetation_area)
        .bind(producer.updated_at)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Producer", &producer.id));
        }
        Ok(())
    }

    pub async fn insert_association(
        conn: &mut SqliteConnection,
        id: &str,
        producer_id: &str,
        crop_id: &str,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO producer_crops (id, producer_id, crop_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(id)
        .bind(producer_id)
        .bind(crop_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Deletes associations by id; returns how many rows went away.
    pub async fn delete_associations(conn: &mut SqliteConnection, ids: &[String]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM producer_crops WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    /// Deletes a producer; its associations go with it (ON DELETE CASCADE).
    pub async fn delete_producer(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM producers WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Producer", id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
