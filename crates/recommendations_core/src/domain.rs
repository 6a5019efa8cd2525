//! crates/recommendations_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A single recommendation record owned by one user.
///
/// `(recommendation_id, created_at)` is the storage primary key;
/// `(user_id, recommendation_id)` identifies the record within the owner's
/// visible set. `user_id` and `created_at` never change after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub recommendation_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub why: String,
    /// Empty until the attachment workflow runs. Always stored in its
    /// durable base form, never with a signature query string.
    pub attachment_url: String,
}

/// The only two fields a client may change on an existing recommendation.
#[derive(Debug, Clone)]
pub struct RecommendationUpdate {
    pub name: String,
    pub why: String,
}

/// Strips the query string (everything from the first `?` onward) from a URL.
///
/// Signed upload URLs carry their capability in the query string; only the
/// base form may ever be persisted.
pub fn strip_query(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}
