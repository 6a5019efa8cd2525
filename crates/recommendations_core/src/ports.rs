//! crates/recommendations_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! blob-storage SDKs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Recommendation, RecommendationUpdate};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, S3).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The caller's credential could not be resolved to an identity.
    #[error("Unauthorized")]
    Unauthorized,
    /// No record matches the requested id under the caller's ownership scope.
    /// Deliberately covers both "does not exist" and "exists but is not
    /// yours", so callers cannot probe for other users' records.
    #[error("Recommendation not found")]
    NotFound,
    /// A delete's exact-key condition did not hold (record already gone).
    #[error("Delete condition failed: record already gone")]
    ConditionFailed,
    /// The store or the upload-URL issuer could not complete the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The only component that talks to the persistent recommendation collection.
///
/// Every multi-record read goes through the ownership index, so query cost is
/// proportional to one user's record count, not the whole collection. No raw
/// "find anything" query is exposed.
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Returns all records owned by `user_id`, in store-native order.
    /// An empty result is a valid, non-error outcome.
    async fn list_by_owner(&self, user_id: &str) -> PortResult<Vec<Recommendation>>;

    /// Point lookup scoped by both owner and id. Returns `Ok(None)` on zero
    /// matches; the caller decides whether that is an error.
    async fn find_by_owner_and_id(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
    ) -> PortResult<Option<Recommendation>>;

    /// Unconditional write of a fully-populated record. Returns the record
    /// verbatim; the store does not mutate it.
    async fn insert(&self, item: Recommendation) -> PortResult<Recommendation>;

    /// Updates exactly `name` and `why` on the record identified by the full
    /// primary key. `user_id`, `created_at` and `attachment_url` are never
    /// touched. Failures propagate to the caller.
    async fn update_fields(
        &self,
        recommendation_id: Uuid,
        created_at: DateTime<Utc>,
        update: &RecommendationUpdate,
    ) -> PortResult<()>;

    /// Deletes the record identified by the full primary key, conditioned on
    /// that exact key existing. Fails with [`PortError::ConditionFailed`]
    /// when the key does not match.
    async fn remove(&self, recommendation_id: Uuid, created_at: DateTime<Utc>) -> PortResult<()>;

    /// Persists the base form of `raw_url` (query string stripped, see
    /// [`crate::domain::strip_query`]) into `attachment_url` of the record
    /// identified by the full primary key.
    async fn set_attachment_url(
        &self,
        recommendation_id: Uuid,
        created_at: DateTime<Utc>,
        raw_url: &str,
    ) -> PortResult<()>;
}

/// Produces time-limited, write-capable URLs for blob-storage keys.
#[async_trait]
pub trait UploadUrlIssuer: Send + Sync {
    /// Returns a signed URL granting a single PUT to `blob_key`, valid for a
    /// configured expiration window.
    async fn issue_upload_url(&self, blob_key: &str) -> PortResult<String>;
}
