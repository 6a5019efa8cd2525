//! services/api/src/adapters/store.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `RecommendationStore` port from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.
//!
//! Every read filters on `user_id` and is served by the ownership index
//! (`idx_recommendations_owner`); point writes key on the full
//! `(recommendation_id, created_at)` primary key.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use recommendations_core::domain::{strip_query, Recommendation, RecommendationUpdate};
use recommendations_core::ports::{PortError, PortResult, RecommendationStore};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "recommendation_id, user_id, created_at, name, why, attachment_url";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `RecommendationStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Transport/service failures all surface as `StoreUnavailable`; row-level
/// outcomes are decided from the query result, not the error.
fn store_err(e: sqlx::Error) -> PortError {
    PortError::StoreUnavailable(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Struct
//=========================================================================================

#[derive(FromRow)]
struct RecommendationRecord {
    recommendation_id: Uuid,
    user_id: String,
    created_at: DateTime<Utc>,
    name: String,
    why: String,
    attachment_url: String,
}

impl RecommendationRecord {
    fn to_domain(self) -> Recommendation {
        Recommendation {
            recommendation_id: self.recommendation_id,
            user_id: self.user_id,
            created_at: self.created_at,
            name: self.name,
            why: self.why,
            attachment_url: self.attachment_url,
        }
    }
}

//=========================================================================================
// `RecommendationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecommendationStore for PgStore {
    async fn list_by_owner(&self, user_id: &str) -> PortResult<Vec<Recommendation>> {
        let query = format!("SELECT {COLUMNS} FROM recommendations WHERE user_id = $1");
        let records = sqlx::query_as::<_, RecommendationRecord>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn find_by_owner_and_id(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
    ) -> PortResult<Option<Recommendation>> {
        let query = format!(
            "SELECT {COLUMNS} FROM recommendations \
             WHERE user_id = $1 AND recommendation_id = $2"
        );
        let record = sqlx::query_as::<_, RecommendationRecord>(&query)
            .bind(user_id)
            .bind(recommendation_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        Ok(record.map(|r| r.to_domain()))
    }

    async fn insert(&self, item: Recommendation) -> PortResult<Recommendation> {
        sqlx::query(
            "INSERT INTO recommendations \
             (recommendation_id, user_id, created_at, name, why, attachment_url) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(item.recommendation_id)
        .bind(&item.user_id)
        .bind(item.created_at)
        .bind(&item.name)
        .bind(&item.why)
        .bind(&item.attachment_url)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(item)
    }

    async fn update_fields(
        &self,
        recommendation_id: Uuid,
        created_at: DateTime<Utc>,
        update: &RecommendationUpdate,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE recommendations SET name = $3, why = $4 \
             WHERE recommendation_id = $1 AND created_at = $2",
        )
        .bind(recommendation_id)
        .bind(created_at)
        .bind(&update.name)
        .bind(&update.why)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, recommendation_id: Uuid, created_at: DateTime<Utc>) -> PortResult<()> {
        let result = sqlx::query(
            "DELETE FROM recommendations \
             WHERE recommendation_id = $1 AND created_at = $2",
        )
        .bind(recommendation_id)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        // Deleting a key that no longer exists is an error, not a no-op.
        if result.rows_affected() == 0 {
            return Err(PortError::ConditionFailed);
        }
        Ok(())
    }

    async fn set_attachment_url(
        &self,
        recommendation_id: Uuid,
        created_at: DateTime<Utc>,
        raw_url: &str,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE recommendations SET attachment_url = $3 \
             WHERE recommendation_id = $1 AND created_at = $2",
        )
        .bind(recommendation_id)
        .bind(created_at)
        .bind(strip_query(raw_url))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound);
        }
        Ok(())
    }
}
