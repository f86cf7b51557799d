//! Postgres-backed ATM store.
//!
//! One row per unit in the `atms` table; banknote counts live in a `jsonb` column
//! keyed by denomination (`{"50": 6, "25": 5}`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed | N/A | `Backend` |
//! | Other | N/A | `Backend` |
//!
//! ## Optimistic Concurrency
//!
//! `save()` is a single `UPDATE ... WHERE id = $1 AND version = $n`. Zero affected
//! rows means either the unit doesn't exist (`NotFound`) or another writer got there
//! first (`Conflict`); the row is left untouched in both cases.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use cashpoint_core::{AggregateRoot, AtmId, ExpectedVersion};
use cashpoint_dispenser::{Atm, Inventory};

use super::r#trait::{AtmStore, StoreError};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS atms (
    id          UUID PRIMARY KEY,
    banknotes   JSONB NOT NULL DEFAULT '{}'::jsonb,
    total       BIGINT NOT NULL DEFAULT 0 CHECK (total >= 0),
    version     BIGINT NOT NULL DEFAULT 0 CHECK (version >= 0),
    created_at  TIMESTAMPTZ NOT NULL,
    updated_at  TIMESTAMPTZ NOT NULL
)
"#;

/// Postgres-backed ATM store.
///
/// Uses an SQLx connection pool, which is `Send + Sync` and shareable across tasks.
pub struct PostgresAtmStore {
    pool: Arc<PgPool>,
}

impl PostgresAtmStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `atms` table if it doesn't exist yet.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }

    async fn exists(&self, id: AtmId) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM atms WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("exists", e))?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl AtmStore for PostgresAtmStore {
    #[instrument(skip(self, atm), fields(atm_id = %atm.id_typed()))]
    async fn create(&self, atm: Atm) -> Result<Atm, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO atms (id, banknotes, total, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*atm.id_typed().as_uuid())
        .bind(Json(atm.inventory()))
        .bind(to_i64("total", atm.total())?)
        .bind(to_i64("version", atm.version())?)
        .bind(atm.created_at())
        .bind(atm.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(|e| match map_sqlx_error("create", e) {
            StoreError::Conflict(_) => StoreError::AlreadyExists(atm.id_typed()),
            other => other,
        })?;

        Ok(atm)
    }

    #[instrument(skip(self), fields(atm_id = %id))]
    async fn load(&self, id: AtmId) -> Result<Option<Atm>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, banknotes, version, created_at, updated_at
            FROM atms
            WHERE id = $1
            "#,
        )
        .bind(*id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load", e))?;

        row.map(|r| atm_from_row(&r)).transpose()
    }

    #[instrument(skip(self, atm), fields(atm_id = %atm.id_typed()))]
    async fn save(&self, atm: Atm, expected_version: ExpectedVersion) -> Result<Atm, StoreError> {
        let id = atm.id_typed();
        let expected = match expected_version {
            ExpectedVersion::Any => None,
            ExpectedVersion::Exact(v) => Some(to_i64("expected_version", v)?),
        };
        let now = Utc::now();

        let row = sqlx::query(
            r#"
            UPDATE atms
            SET banknotes = $2,
                total = $3,
                version = version + 1,
                updated_at = $4
            WHERE id = $1
                AND ($5::bigint IS NULL OR version = $5)
            RETURNING id, banknotes, version, created_at, updated_at
            "#,
        )
        .bind(*id.as_uuid())
        .bind(Json(atm.inventory()))
        .bind(to_i64("total", atm.total())?)
        .bind(now)
        .bind(expected)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("save", e))?;

        let Some(row) = row else {
            if self.exists(id).await? {
                return Err(StoreError::Conflict(format!(
                    "expected {expected_version:?}, row has moved on"
                )));
            }
            return Err(StoreError::NotFound(id));
        };

        atm_from_row(&row)
    }
}

fn atm_from_row(row: &PgRow) -> Result<Atm, StoreError> {
    let read = |e: sqlx::Error| StoreError::Serialization(format!("failed to read atm row: {e}"));

    let id: uuid::Uuid = row.try_get("id").map_err(read)?;
    let Json(inventory): Json<Inventory> = row.try_get("banknotes").map_err(read)?;
    let version: i64 = row.try_get("version").map_err(read)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(read)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(read)?;

    if inventory.checked_total().is_none() {
        return Err(StoreError::Serialization(format!(
            "atm {id} holds banknotes whose total overflows"
        )));
    }

    let version = u64::try_from(version)
        .map_err(|_| StoreError::Serialization(format!("negative version {version}")))?;

    Ok(Atm::restore(
        AtmId::from_uuid(id),
        inventory,
        version,
        created_at,
        updated_at,
    ))
}

fn to_i64(field: &str, value: u64) -> Result<i64, StoreError> {
    i64::try_from(value)
        .map_err(|_| StoreError::Serialization(format!("{field} {value} exceeds bigint range")))
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
