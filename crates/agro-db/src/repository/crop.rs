//! # Crop Repository
//!
//! Read access to the crop catalog. Crops are reference data seeded by
//! migration `002`; nothing in the registry writes them.

use agro_core::Crop;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Repository for the crop catalog.
#[derive(Debug, Clone)]
pub struct CropRepository {
    pool: SqlitePool,
}

impl CropRepository {
    /// Creates a new CropRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CropRepository { pool }
    }

    /// Lists every crop, sorted by name.
    pub async fn find_all(&self) -> DbResult<Vec<Crop>> {
        let crops = sqlx::query_as::<_, Crop>("SELECT id, name FROM crops ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = crops.len(), "Listed crops");
        Ok(crops)
    }

    /// Returns the crops whose id is in `ids`, sorted by name.
    ///
    /// Missing ids are silently skipped; callers compare counts to detect
    /// them.
    pub async fn find_by_ids(&self, ids: &[String]) -> DbResult<Vec<Crop>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT id, name FROM crops WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY name");

        let crops = builder.build_query_as::<Crop>().fetch_all(&self.pool).await?;

        debug!(requested = ids.len(), found = crops.len(), "Resolved crop ids");
        Ok(crops)
    }
}
