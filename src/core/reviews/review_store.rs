// Storage trait (port) for review records.
//
// Several services share this port (admission gate, submissions, moderation,
// votes), so it lives in its own file rather than next to a single service.
// The store is the single source of truth; conflicting writes serialize at
// the store level (last write wins).

use crate::core::reviews::review_models::{
    DecisionUpdate, Page, PublicReviewQuery, RatingSummary, Review, ReviewFlag, ReviewStatistics,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Error surfaced by `ReviewStore` implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Unavailable(String),
}

/// Data persistence contract for reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a freshly built review. Ids are assigned by the caller.
    async fn create_review(&self, review: &Review) -> Result<(), StoreError>;

    /// Fetch a single review with its flags.
    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, StoreError>;

    /// Whether the submitter already has a review awaiting moderation.
    async fn has_pending_review(&self, user_id: &str) -> Result<bool, StoreError>;

    /// Count of the submitter's reviews (any status) created at or after
    /// `since`. Recomputed per admission check, never cached.
    async fn count_reviews_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Apply an admin decision in a single write. Returns the updated review,
    /// or None when the id does not exist.
    async fn apply_decision(
        &self,
        id: Uuid,
        update: DecisionUpdate,
    ) -> Result<Option<Review>, StoreError>;

    /// Increment the helpful counter by one. Returns the new count, or None
    /// when the id does not exist.
    async fn increment_helpful_votes(&self, id: Uuid) -> Result<Option<i64>, StoreError>;

    /// Append a flag and bump the report counter. Returns the new report
    /// count, or None when the id does not exist.
    async fn append_flag(&self, id: Uuid, flag: ReviewFlag) -> Result<Option<i64>, StoreError>;

    /// Approved reviews matching the query, paged.
    async fn list_public(&self, query: &PublicReviewQuery) -> Result<Page<Review>, StoreError>;

    /// Average rating and star distribution over approved reviews.
    async fn rating_summary(&self) -> Result<RatingSummary, StoreError>;

    /// Pending reviews, newest first.
    async fn list_pending(&self, page: u32, limit: u32) -> Result<Page<Review>, StoreError>;

    /// Service-wide counters for the statistics endpoint.
    async fn statistics(&self) -> Result<ReviewStatistics, StoreError>;

    /// Cheap connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
