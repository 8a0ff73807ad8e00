//! # Database Migrations
//!
//! Embedded SQL migrations for the producer registry.
//!
//! ## Schema
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐        ┌──────────────┐
//! │    producers     │        │  producer_crops  │        │    crops     │
//! │──────────────────│        │──────────────────│        │──────────────│
//! │ id          PK   │◄───────│ producer_id  FK  │        │ id      PK   │
//! │ document UNIQUE  │ CASCADE│ crop_id      FK  │───────►│ name UNIQUE  │
//! │ areas (INTEGER)  │        │ UNIQUE(p, c)     │CASCADE │ (seeded)     │
//! └──────────────────┘        └──────────────────┘        └──────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/sqlite/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations - always add new ones

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations from `migrations/sqlite`, embedded at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Runs all pending database migrations.
///
/// Each migration runs in its own transaction and is recorded in
/// `_sqlx_migrations`, so repeated calls are no-ops.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(embedded, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.run_migrations().await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(applied, total);
    }

    #[tokio::test]
    async fn test_crop_seed_matches_core_constants() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        for (id, name) in agro_core::SEED_CROPS {
            let stored: String = sqlx::query_scalar("SELECT name FROM crops WHERE id = ?1")
                .bind(id)
                .fetch_one(db.pool())
                .await
                .unwrap();
            assert_eq!(stored, name);
        }
    }
}
