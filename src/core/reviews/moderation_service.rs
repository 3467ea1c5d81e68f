// Moderation state machine - admin decisions over queued reviews.
//
// The transition function lives on ReviewStatus (see review_models.rs) and
// is total: approved and rejected are re-enterable any number of times.
// Concurrent decisions for the same review resolve last-write-wins at the
// store; there is no optimistic-concurrency token.

use crate::core::notifications::{NotificationHub, ServerEvent};
use crate::core::reviews::review_models::{
    AdminResponse, DecisionAction, DecisionUpdate, Review, ReviewStatus, UserIdentity,
    MAX_ADMIN_RESPONSE_CHARS,
};
use crate::core::reviews::review_store::{ReviewStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Invalid status. Must be \"approved\" or \"rejected\"")]
    InvalidStatus,

    #[error("Admin response must be {MAX_ADMIN_RESPONSE_CHARS} characters or less")]
    ResponseTooLong,

    #[error("Review not found")]
    NotFound,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<StoreError> for ModerationError {
    fn from(err: StoreError) -> Self {
        ModerationError::StorageError(err.to_string())
    }
}

pub struct ModerationService<S: ReviewStore> {
    store: S,
    hub: Arc<NotificationHub>,
}

impl<S: ReviewStore> ModerationService<S> {
    pub fn new(store: S, hub: Arc<NotificationHub>) -> Self {
        Self { store, hub }
    }

    /// Applies an admin decision.
    ///
    /// `target_status` must be exactly "approved" or "rejected"; anything
    /// else fails with InvalidStatus before any store access. Transitioning
    /// into approved force-resets `is_featured`. Non-empty response text
    /// (after trimming) overwrites any prior admin response; empty or absent
    /// text leaves a prior response untouched.
    ///
    /// On success the submitter's private channel gets a decision event,
    /// fire-and-forget: nobody connected is not an error and nothing is
    /// queued for later.
    pub async fn decide(
        &self,
        review_id: Uuid,
        target_status: &str,
        decider: &UserIdentity,
        response_text: Option<&str>,
    ) -> Result<Review, ModerationError> {
        let action = DecisionAction::parse(target_status).ok_or(ModerationError::InvalidStatus)?;

        let admin_response = match response_text.map(str::trim) {
            Some(text) if !text.is_empty() => {
                if text.chars().count() > MAX_ADMIN_RESPONSE_CHARS {
                    return Err(ModerationError::ResponseTooLong);
                }
                Some(AdminResponse {
                    text: text.to_string(),
                    responded_by: decider.id.clone(),
                    responded_at: Utc::now(),
                })
            }
            _ => None,
        };

        let current = self
            .store
            .get_review(review_id)
            .await?
            .ok_or(ModerationError::NotFound)?;

        let next = current.status.decide(action);
        let update = DecisionUpdate {
            status: next,
            reset_featured: next == ReviewStatus::Approved,
            admin_response,
        };

        let updated = self
            .store
            .apply_decision(review_id, update)
            .await?
            .ok_or(ModerationError::NotFound)?;

        tracing::info!(
            review = %updated.id,
            status = %updated.status,
            decider = %decider.id,
            "review decided"
        );

        self.hub
            .notify_decision(&updated.user_id, ServerEvent::decision(&updated));

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reviews::review_models::*;
    use crate::infra::reviews::InMemoryReviewStore;
    use tokio::sync::mpsc;

    async fn seeded_review(store: &InMemoryReviewStore, user_id: &str) -> Review {
        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            user_name: "Ada".to_string(),
            user_email: "ada@example.com".to_string(),
            rating: 4,
            review: "Solid".to_string(),
            app_store: AppStoreChannel::Web,
            status: ReviewStatus::Pending,
            is_featured: true,
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

    fn admin() -> UserIdentity {
        UserIdentity {
            id: "admin-1".to_string(),
            name: "Mod".to_string(),
            email: "mod@example.com".to_string(),
            role: UserRole::Admin,
        }
    }

    fn service(store: InMemoryReviewStore) -> ModerationService<InMemoryReviewStore> {
        ModerationService::new(store, Arc::new(NotificationHub::new()))
    }

    #[tokio::test]
    async fn invalid_target_status_mutates_nothing() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = ModerationService::new(store.clone(), Arc::new(NotificationHub::new()));

        for status in ["pending", "APPROVED", "published", ""] {
            assert!(matches!(
                svc.decide(review.id, status, &admin(), None).await,
                Err(ModerationError::InvalidStatus)
            ));
        }

        let unchanged = store.get_review(review.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn approval_resets_the_featured_flag() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        assert!(review.is_featured);

        let svc = service(store);
        let updated = svc
            .decide(review.id, "approved", &admin(), Some("Thanks!"))
            .await
            .unwrap();

        assert_eq!(updated.status, ReviewStatus::Approved);
        assert!(!updated.is_featured);
        assert_eq!(updated.admin_response.unwrap().text, "Thanks!");
    }

    #[tokio::test]
    async fn redecision_keeps_the_latest_status_and_prior_response() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = service(store);

        svc.decide(review.id, "approved", &admin(), Some("Thanks!"))
            .await
            .unwrap();
        let rejected = svc.decide(review.id, "rejected", &admin(), None).await.unwrap();
        assert_eq!(rejected.status, ReviewStatus::Rejected);
        // No new text: the earlier response survives the redecision.
        assert_eq!(rejected.admin_response.as_ref().unwrap().text, "Thanks!");

        let approved_again = svc
            .decide(review.id, "approved", &admin(), Some("Changed our mind"))
            .await
            .unwrap();
        assert_eq!(approved_again.status, ReviewStatus::Approved);
        assert_eq!(
            approved_again.admin_response.unwrap().text,
            "Changed our mind"
        );
    }

    #[tokio::test]
    async fn whitespace_only_response_text_is_treated_as_absent() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = service(store);

        let updated = svc
            .decide(review.id, "rejected", &admin(), Some("   "))
            .await
            .unwrap();
        assert!(updated.admin_response.is_none());
    }

    #[tokio::test]
    async fn overlong_response_text_is_rejected() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = service(store);

        let text = "x".repeat(MAX_ADMIN_RESPONSE_CHARS + 1);
        assert!(matches!(
            svc.decide(review.id, "approved", &admin(), Some(&text)).await,
            Err(ModerationError::ResponseTooLong)
        ));
    }

    #[tokio::test]
    async fn unknown_review_id_is_not_found() {
        let svc = service(InMemoryReviewStore::new());
        assert!(matches!(
            svc.decide(Uuid::new_v4(), "approved", &admin(), None).await,
            Err(ModerationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn connected_submitter_receives_the_decision_event() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;

        let hub = Arc::new(NotificationHub::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.connect(
            UserIdentity {
                id: "user-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                role: UserRole::User,
            },
            tx,
        )
        .unwrap();

        let svc = ModerationService::new(store, hub);
        svc.decide(review.id, "approved", &admin(), Some("Thanks!"))
            .await
            .unwrap();

        match rx.try_recv().unwrap() {
            ServerEvent::ReviewApproved {
                review_id,
                admin_response,
                ..
            } => {
                assert_eq!(review_id, review.id);
                assert_eq!(admin_response.unwrap().text, "Thanks!");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn disconnected_submitter_is_a_silent_no_op() {
        let store = InMemoryReviewStore::new();
        let review = seeded_review(&store, "user-1").await;
        let svc = service(store);

        // Nobody connected: the decision still succeeds.
        let updated = svc.decide(review.id, "rejected", &admin(), None).await.unwrap();
        assert_eq!(updated.status, ReviewStatus::Rejected);
    }
}
