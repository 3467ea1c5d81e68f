// Admission gate - pre-submission policy checks.
//
// These checks are identity-based and derived from the store on every call.
// They are independent of the transport-level IP rate limiter in the HTTP
// layer; both must pass for a submission to proceed. A rejected admission is
// final for that request - the caller waits out the window, there is no
// retry path.

use crate::core::reviews::review_store::{ReviewStore, StoreError};
use chrono::{Duration, Utc};
use thiserror::Error;

/// Reviews allowed per submitter inside the trailing window, any status.
pub const MAX_REVIEWS_PER_WINDOW: u64 = 3;

/// Trailing admission window in hours.
pub const ADMISSION_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The submitter already has a review awaiting moderation.
    #[error("You already have a pending review. Please wait for approval.")]
    DuplicatePending,

    /// The submitter created too many reviews inside the trailing window.
    #[error("Too many review submissions. Please try again tomorrow.")]
    RateExceeded,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Gatekeeper that decides whether a submission may enter the system.
pub struct AdmissionGate<S: ReviewStore> {
    store: S,
}

impl<S: ReviewStore> AdmissionGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Checks run in order: duplicate-pending first, then the trailing
    /// 24-hour count. Evaluation time is the moment of this call.
    pub async fn admit(&self, user_id: &str) -> Result<(), AdmissionError> {
        if self.store.has_pending_review(user_id).await? {
            return Err(AdmissionError::DuplicatePending);
        }

        let window_start = Utc::now() - Duration::hours(ADMISSION_WINDOW_HOURS);
        let recent = self.store.count_reviews_since(user_id, window_start).await?;
        if recent >= MAX_REVIEWS_PER_WINDOW {
            return Err(AdmissionError::RateExceeded);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reviews::review_models::*;
    use crate::infra::reviews::InMemoryReviewStore;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn review_at(user_id: &str, status: ReviewStatus, created_at: DateTime<Utc>) -> Review {
        Review {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            user_name: "Test User".to_string(),
            user_email: "test@example.com".to_string(),
            rating: 4,
            review: String::new(),
            app_store: AppStoreChannel::Web,
            status,
            is_featured: false,
            helpful_votes: 0,
            unhelpful_votes: 0,
            report_count: 0,
            admin_response: None,
            flags: Vec::new(),
            device_info: DeviceInfo::default(),
            metadata: ReviewMetadata::default(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn admits_a_first_time_submitter() {
        let store = InMemoryReviewStore::new();
        let gate = AdmissionGate::new(store.clone());

        assert!(gate.admit("user-1").await.is_ok());
    }

    #[tokio::test]
    async fn rejects_when_a_pending_review_exists() {
        let store = InMemoryReviewStore::new();
        store
            .create_review(&review_at("user-1", ReviewStatus::Pending, Utc::now()))
            .await
            .unwrap();

        let gate = AdmissionGate::new(store);
        assert!(matches!(
            gate.admit("user-1").await,
            Err(AdmissionError::DuplicatePending)
        ));
    }

    #[tokio::test]
    async fn duplicate_pending_outranks_the_rate_check() {
        let store = InMemoryReviewStore::new();
        // A pending review plus enough recent ones to also trip the rate
        // check - the pending rejection must win since it runs first.
        store
            .create_review(&review_at("user-1", ReviewStatus::Pending, Utc::now()))
            .await
            .unwrap();
        for _ in 0..3 {
            store
                .create_review(&review_at("user-1", ReviewStatus::Approved, Utc::now()))
                .await
                .unwrap();
        }

        let gate = AdmissionGate::new(store);
        assert!(matches!(
            gate.admit("user-1").await,
            Err(AdmissionError::DuplicatePending)
        ));
    }

    #[tokio::test]
    async fn rejects_fourth_review_inside_the_window() {
        let store = InMemoryReviewStore::new();
        // Three decided reviews within the window, none pending.
        for _ in 0..3 {
            store
                .create_review(&review_at("user-1", ReviewStatus::Rejected, Utc::now()))
                .await
                .unwrap();
        }

        let gate = AdmissionGate::new(store);
        assert!(matches!(
            gate.admit("user-1").await,
            Err(AdmissionError::RateExceeded)
        ));
    }

    #[tokio::test]
    async fn admits_again_after_the_window_elapses() {
        let store = InMemoryReviewStore::new();
        let stale = Utc::now() - chrono::Duration::hours(25);
        for _ in 0..3 {
            store
                .create_review(&review_at("user-1", ReviewStatus::Approved, stale))
                .await
                .unwrap();
        }

        let gate = AdmissionGate::new(store);
        assert!(gate.admit("user-1").await.is_ok());
    }

    #[tokio::test]
    async fn other_submitters_do_not_count_against_the_window() {
        let store = InMemoryReviewStore::new();
        for _ in 0..3 {
            store
                .create_review(&review_at("user-2", ReviewStatus::Approved, Utc::now()))
                .await
                .unwrap();
        }

        let gate = AdmissionGate::new(store);
        assert!(gate.admit("user-1").await.is_ok());
    }
}
