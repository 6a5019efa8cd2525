//! crates/recommendations_core/src/service.rs
//!
//! The orchestration component: composes the store and upload-URL ports into
//! the five recommendation use cases and enforces ownership before any
//! mutation. Identity is resolved once at the adaptation boundary; this
//! service only ever sees a plain `user_id` and never re-parses credentials.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use uuid::Uuid;

use crate::domain::{Recommendation, RecommendationUpdate};
use crate::ports::{PortError, PortResult, RecommendationStore, UploadUrlIssuer};

/// Backoff delays between retries of transient store/issuer failures.
const RETRY_DELAYS_MS: [u64; 2] = [100, 400];

/// The current time truncated to microsecond precision.
///
/// Stores keep timestamps at microsecond resolution, so a nanosecond-precise
/// `created_at` would make the record returned from `create` differ from what
/// later reads return. Truncating up front keeps the create response
/// identical to every subsequent read.
fn creation_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Retry a port call with bounded backoff.
///
/// Only [`PortError::StoreUnavailable`] is considered transient; every other
/// error kind returns immediately. After the delay table is exhausted one
/// final attempt is made and its error propagates.
async fn with_retry<T, F, Fut>(op: &str, mut call: F) -> PortResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = PortResult<T>>,
{
    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match call().await {
            Ok(value) => return Ok(value),
            Err(PortError::StoreUnavailable(reason)) => {
                tracing::warn!(
                    op,
                    attempt = attempt + 1,
                    reason = %reason,
                    "Transient store failure, retrying"
                );
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
            Err(other) => return Err(other),
        }
    }
    call().await
}

/// Stateless, request-scoped orchestration over the two ports.
///
/// Constructed once at startup around process-wide port singletons and shared
/// by reference across all requests.
#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn RecommendationStore>,
    issuer: Arc<dyn UploadUrlIssuer>,
}

impl RecommendationService {
    /// Creates a new `RecommendationService`.
    pub fn new(store: Arc<dyn RecommendationStore>, issuer: Arc<dyn UploadUrlIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Returns every recommendation owned by `user_id`, in store-native order.
    pub async fn list_all(&self, user_id: &str) -> PortResult<Vec<Recommendation>> {
        with_retry("list_by_owner", || self.store.list_by_owner(user_id)).await
    }

    /// Creates a new recommendation owned by `user_id`.
    ///
    /// The id and timestamp are generated here, never taken from the client,
    /// and the attachment slot starts empty. The inserted record is returned
    /// verbatim.
    pub async fn create(
        &self,
        user_id: &str,
        fields: RecommendationUpdate,
    ) -> PortResult<Recommendation> {
        let item = Recommendation {
            recommendation_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            created_at: creation_timestamp(),
            name: fields.name,
            why: fields.why,
            attachment_url: String::new(),
        };
        with_retry("insert", || self.store.insert(item.clone())).await
    }

    /// Fetches one recommendation under the caller's ownership scope.
    ///
    /// A record owned by someone else is indistinguishable from a record
    /// that does not exist: both are `NotFound`.
    pub async fn get_one(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
    ) -> PortResult<Recommendation> {
        self.find_owned(user_id, recommendation_id).await
    }

    /// Updates `name` and `why` on a recommendation the caller owns.
    ///
    /// The primary key used for the write comes from the looked-up record,
    /// never from client input.
    pub async fn update(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
        update: RecommendationUpdate,
    ) -> PortResult<()> {
        let item = self.find_owned(user_id, recommendation_id).await?;
        with_retry("update_fields", || {
            self.store
                .update_fields(item.recommendation_id, item.created_at, &update)
        })
        .await
    }

    /// Permanently deletes a recommendation the caller owns.
    pub async fn delete(&self, user_id: &str, recommendation_id: Uuid) -> PortResult<()> {
        let item = self.find_owned(user_id, recommendation_id).await?;
        with_retry("remove", || {
            self.store.remove(item.recommendation_id, item.created_at)
        })
        .await
    }

    /// Issues a signed upload URL for a recommendation the caller owns.
    ///
    /// A fresh blob key is minted per upload (never the recommendation id),
    /// so a stale signed URL cannot be replayed against a later upload. The
    /// record's `attachment_url` is set to the base form of the URL at
    /// issuance time, before the client has uploaded anything; that window
    /// is a deliberate property of the two-step workflow. The full signed
    /// URL is returned to the caller and never persisted.
    pub async fn prepare_attachment(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
    ) -> PortResult<String> {
        let item = self.find_owned(user_id, recommendation_id).await?;

        let blob_key = Uuid::new_v4().to_string();
        let upload_url = with_retry("issue_upload_url", || {
            self.issuer.issue_upload_url(&blob_key)
        })
        .await?;

        with_retry("set_attachment_url", || {
            self.store
                .set_attachment_url(item.recommendation_id, item.created_at, &upload_url)
        })
        .await?;

        Ok(upload_url)
    }

    /// Ownership-scoped lookup shared by every single-record use case.
    async fn find_owned(
        &self,
        user_id: &str,
        recommendation_id: Uuid,
    ) -> PortResult<Recommendation> {
        with_retry("find_by_owner_and_id", || {
            self.store.find_by_owner_and_id(user_id, recommendation_id)
        })
        .await?
        .ok_or(PortError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strip_query;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// In-memory store used to exercise the service without a database.
    #[derive(Default)]
    struct MemoryStore {
        items: Mutex<Vec<Recommendation>>,
        /// Number of calls that should fail with `StoreUnavailable` before
        /// the store starts succeeding again.
        failures_remaining: AtomicU32,
        find_calls: AtomicU32,
    }

    impl MemoryStore {
        fn with_items(items: Vec<Recommendation>) -> Self {
            Self {
                items: Mutex::new(items),
                ..Self::default()
            }
        }

        fn fail_next(&self, n: u32) {
            self.failures_remaining.store(n, Ordering::SeqCst);
        }

        fn check_availability(&self) -> PortResult<()> {
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(PortError::StoreUnavailable("injected outage".to_string()));
            }
            Ok(())
        }

        fn snapshot(&self) -> Vec<Recommendation> {
            self.items.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecommendationStore for MemoryStore {
        async fn list_by_owner(&self, user_id: &str) -> PortResult<Vec<Recommendation>> {
            self.check_availability()?;
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|i| i.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn find_by_owner_and_id(
            &self,
            user_id: &str,
            recommendation_id: Uuid,
        ) -> PortResult<Option<Recommendation>> {
            self.find_calls.fetch_add(1, Ordering::SeqCst);
            self.check_availability()?;
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .find(|i| i.user_id == user_id && i.recommendation_id == recommendation_id)
                .cloned())
        }

        async fn insert(&self, item: Recommendation) -> PortResult<Recommendation> {
            self.check_availability()?;
            self.items.lock().unwrap().push(item.clone());
            Ok(item)
        }

        async fn update_fields(
            &self,
            recommendation_id: Uuid,
            created_at: DateTime<Utc>,
            update: &RecommendationUpdate,
        ) -> PortResult<()> {
            self.check_availability()?;
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.recommendation_id == recommendation_id && i.created_at == created_at)
                .ok_or(PortError::NotFound)?;
            item.name = update.name.clone();
            item.why = update.why.clone();
            Ok(())
        }

        async fn remove(
            &self,
            recommendation_id: Uuid,
            created_at: DateTime<Utc>,
        ) -> PortResult<()> {
            self.check_availability()?;
            let mut items = self.items.lock().unwrap();
            let before = items.len();
            items.retain(|i| {
                !(i.recommendation_id == recommendation_id && i.created_at == created_at)
            });
            if items.len() == before {
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
            self.check_availability()?;
            let mut items = self.items.lock().unwrap();
            let item = items
                .iter_mut()
                .find(|i| i.recommendation_id == recommendation_id && i.created_at == created_at)
                .ok_or(PortError::NotFound)?;
            item.attachment_url = strip_query(raw_url).to_string();
            Ok(())
        }
    }

    struct FakeIssuer;

    #[async_trait]
    impl UploadUrlIssuer for FakeIssuer {
        async fn issue_upload_url(&self, blob_key: &str) -> PortResult<String> {
            Ok(format!(
                "https://attachments.test/{blob_key}?X-Amz-Signature=abc&X-Amz-Expires=300"
            ))
        }
    }

    fn service_with(store: Arc<MemoryStore>) -> RecommendationService {
        RecommendationService::new(store, Arc::new(FakeIssuer))
    }

    fn fields(name: &str, why: &str) -> RecommendationUpdate {
        RecommendationUpdate {
            name: name.to_string(),
            why: why.to_string(),
        }
    }

    #[tokio::test]
    async fn create_sets_owner_and_starts_with_empty_attachment() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        let first = service.create("u1", fields("Dune", "great")).await.unwrap();
        let second = service.create("u1", fields("Dune", "great")).await.unwrap();

        assert_eq!(first.user_id, "u1");
        assert_eq!(first.attachment_url, "");
        // Fresh identity on every call.
        assert_ne!(first.recommendation_id, second.recommendation_id);
        assert_eq!(store.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn created_at_has_microsecond_precision() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store);

        let item = service.create("u1", fields("Dune", "great")).await.unwrap();
        // Sub-microsecond digits would be lost on the first write and make
        // the create response diverge from later reads.
        assert_eq!(item.created_at.nanosecond() % 1_000, 0);
    }

    #[tokio::test]
    async fn other_users_records_are_invisible() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store);

        let item = service.create("a", fields("Dune", "great")).await.unwrap();

        let get = service.get_one("b", item.recommendation_id).await;
        assert!(matches!(get, Err(PortError::NotFound)));

        let update = service
            .update("b", item.recommendation_id, fields("X", "Y"))
            .await;
        assert!(matches!(update, Err(PortError::NotFound)));

        let delete = service.delete("b", item.recommendation_id).await;
        assert!(matches!(delete, Err(PortError::NotFound)));

        // The owner can still see it.
        assert!(service.get_one("a", item.recommendation_id).await.is_ok());
    }

    #[tokio::test]
    async fn update_touches_only_name_and_why() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store);

        let created = service.create("u1", fields("Dune", "great")).await.unwrap();
        service
            .update("u1", created.recommendation_id, fields("X", "Y"))
            .await
            .unwrap();

        let fetched = service
            .get_one("u1", created.recommendation_id)
            .await
            .unwrap();
        assert_eq!(fetched.name, "X");
        assert_eq!(fetched.why, "Y");
        assert_eq!(fetched.recommendation_id, created.recommendation_id);
        assert_eq!(fetched.created_at, created.created_at);
        assert_eq!(fetched.user_id, created.user_id);
        assert_eq!(fetched.attachment_url, created.attachment_url);
    }

    #[tokio::test]
    async fn delete_is_permanent_and_repeat_delete_fails_on_condition() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        let item = service.create("u1", fields("Dune", "great")).await.unwrap();
        service.delete("u1", item.recommendation_id).await.unwrap();

        let get = service.get_one("u1", item.recommendation_id).await;
        assert!(matches!(get, Err(PortError::NotFound)));

        // The record is gone, so the second delete fails at the
        // ownership-scoped lookup.
        let again = service.delete("u1", item.recommendation_id).await;
        assert!(matches!(again, Err(PortError::NotFound)));

        // Deleting by exact key after the row is gone trips the store's
        // delete condition directly.
        let direct = store.remove(item.recommendation_id, item.created_at).await;
        assert!(matches!(direct, Err(PortError::ConditionFailed)));
    }

    #[tokio::test]
    async fn prepare_attachment_returns_signed_url_and_persists_base_form() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store);

        let item = service.create("u1", fields("Dune", "great")).await.unwrap();
        let signed = service
            .prepare_attachment("u1", item.recommendation_id)
            .await
            .unwrap();

        assert!(signed.contains('?'), "issued URL must carry a signature");

        let fetched = service
            .get_one("u1", item.recommendation_id)
            .await
            .unwrap();
        assert_eq!(fetched.attachment_url, strip_query(&signed));
        // The blob key is minted per upload, not reused from the record id.
        assert!(!signed.contains(&item.recommendation_id.to_string()));
    }

    #[tokio::test]
    async fn transient_store_failure_is_retried_to_success() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        store.fail_next(1);
        let item = service.create("u1", fields("Dune", "great")).await.unwrap();
        assert_eq!(item.user_id, "u1");
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        // More injected failures than attempts (2 retries + final): exhaustion
        // surfaces the transient error to the caller.
        store.fail_next(10);
        let result = service.list_all("u1").await;
        assert!(matches!(result, Err(PortError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store.clone());

        let missing = service.get_one("u1", Uuid::new_v4()).await;
        assert!(matches!(missing, Err(PortError::NotFound)));
        assert_eq!(store.find_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn full_lifecycle_scenario() {
        let store = Arc::new(MemoryStore::default());
        let service = service_with(store);

        let created = service
            .create("u1", fields("Dune", "great world-building"))
            .await
            .unwrap();

        let listed = service.list_all("u1").await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        service
            .update(
                "u1",
                created.recommendation_id,
                fields("Dune", "best sci-fi ever"),
            )
            .await
            .unwrap();
        let fetched = service
            .get_one("u1", created.recommendation_id)
            .await
            .unwrap();
        assert_eq!(fetched.why, "best sci-fi ever");

        let signed = service
            .prepare_attachment("u1", created.recommendation_id)
            .await
            .unwrap();
        let with_attachment = service
            .get_one("u1", created.recommendation_id)
            .await
            .unwrap();
        assert!(signed.starts_with(&with_attachment.attachment_url));

        service
            .delete("u1", created.recommendation_id)
            .await
            .unwrap();
        assert!(service.list_all("u1").await.unwrap().is_empty());
    }
}
