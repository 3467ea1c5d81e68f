// Vote/report aggregator - helpful votes and user reports.
//
// Helpful votes are not deduplicated per voter: every non-self call adds
// exactly one. The dedup policy for repeat voters was never settled, so the
// unlimited-increment behavior is kept deliberately (and pinned by a test)
// rather than silently changed.

use crate::core::reviews::review_models::{ReviewFlag, UserIdentity};
use crate::core::reviews::review_store::{ReviewStore, StoreError};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_FLAG_REASON: &str = "No reason provided";

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("You cannot vote on your own review")]
    SelfVote,

    #[error("Review not found")]
    NotFound,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<StoreError> for VoteError {
    fn from(err: StoreError) -> Self {
        VoteError::StorageError(err.to_string())
    }
}

pub struct VoteService<S: ReviewStore> {
    store: S,
}

impl<S: ReviewStore> VoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Marks a review helpful on behalf of `voter`. Voting on your own
    /// review is rejected and leaves the counter unchanged. Returns the new
    /// helpful count.
    pub async fn mark_helpful(&self, review_id: Uuid, voter: &UserIdentity) -> Result<i64, VoteError> {
        let review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or(VoteError::NotFound)?;

        if review.user_id == voter.id {
            return Err(VoteError::SelfVote);
        }

        self.store
            .increment_helpful_votes(review_id)
            .await?
            .ok_or(VoteError::NotFound)
    }

    /// Appends a flag to the review and bumps its report counter. Flags are
    /// append-only; returns the new report count.
    pub async fn report(
        &self,
        review_id: Uuid,
        reporter: &UserIdentity,
        reason: Option<String>,
    ) -> Result<i64, VoteError> {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_FLAG_REASON.to_string());

        let flag = ReviewFlag {
            user_id: reporter.id.clone(),
            reason,
            created_at: Utc::now(),
        };

        self.store
            .append_flag(review_id, flag)
            .await?
            .ok_or(VoteError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reviews::review_models::*;
    use crate::infra::reviews::InMemoryReviewStore;

    async fn seeded_review(store: &InMemoryReviewStore, user_id: &str) -> Review {
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
            rating: 5,
            review: "Lovely".to_string(),
            app_store: AppStoreChannel::Web,
            status: ReviewStatus::Approved,
            is_featured: false,
            helpful_votes: 0,
            unhelpful_votes: 0,
            report_count: 0,
            admin_response: None,
            flags: Vec::new(),
            device_info: DeviceInfo::default(),
            metadata: ReviewMetadata::default(),
            created_at: now,
            updated_at: now,
        };
        store.create_review(&review).await.unwrap();
        review
    }

    fn voter(id: &str) -> UserIdentity {
        UserIdentity {
            id: id.to_string(),
            name: "Voter".to_string(),
            email: "voter@example.com".to_string(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn self_vote_is_rejected_and_counter_is_untouched() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = VoteService::new(store.clone());

        assert!(matches!(
            svc.mark_helpful(review.id, &voter("user-1")).await,
            Err(VoteError::SelfVote)
        ));

        let unchanged = store.get_review(review.id).await.unwrap().unwrap();
        assert_eq!(unchanged.helpful_votes, 0);
    }

    #[tokio::test]
    async fn each_foreign_vote_increments_by_exactly_one() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = VoteService::new(store);

        assert_eq!(svc.mark_helpful(review.id, &voter("user-2")).await.unwrap(), 1);
        // Same voter again: no dedup, the counter keeps climbing.
        assert_eq!(svc.mark_helpful(review.id, &voter("user-2")).await.unwrap(), 2);
        assert_eq!(svc.mark_helpful(review.id, &voter("user-3")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn voting_on_an_unknown_review_is_not_found() {
        let svc = VoteService::new(InMemoryReviewStore::new());
        assert!(matches!(
            svc.mark_helpful(Uuid::new_v4(), &voter("user-2")).await,
            Err(VoteError::NotFound)
        ));
    }

    #[tokio::test]
    async fn reports_append_flags_and_bump_the_counter() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = VoteService::new(store.clone());

        assert_eq!(
            svc.report(review.id, &voter("user-2"), Some("spam".to_string()))
                .await
                .unwrap(),
            1
        );
        assert_eq!(svc.report(review.id, &voter("user-3"), None).await.unwrap(), 2);

        let flagged = store.get_review(review.id).await.unwrap().unwrap();
        assert_eq!(flagged.report_count, 2);
        assert_eq!(flagged.flags.len(), 2);
        assert_eq!(flagged.flags[0].reason, "spam");
        assert_eq!(flagged.flags[1].reason, "No reason provided");
    }
}
