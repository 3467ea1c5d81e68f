// Review submission and read paths.
//
// Submission runs validation, the admission gate, the store write, and the
// admin-room broadcast, in that order. The read paths (public listing,
// pending queue, statistics) are plain queries against the store.

use crate::core::notifications::{NotificationHub, ReviewSummary};
use crate::core::reviews::admission_service::{AdmissionError, AdmissionGate};
use crate::core::reviews::review_models::{
    Page, PublicReviewQuery, RatingSummary, Review, ReviewStatistics, ReviewStatus, SubmitReview,
    UserIdentity, MAX_REVIEW_CHARS,
};
use crate::core::reviews::review_store::{ReviewStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Please provide a valid rating (1-5)")]
    InvalidRating,

    #[error("Review must be {MAX_REVIEW_CHARS} characters or less")]
    ReviewTooLong,

    #[error("You already have a pending review. Please wait for approval.")]
    DuplicatePending,

    #[error("Too many review submissions. Please try again tomorrow.")]
    RateExceeded,

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl From<StoreError> for ReviewError {
    fn from(err: StoreError) -> Self {
        ReviewError::StorageError(err.to_string())
    }
}

impl From<AdmissionError> for ReviewError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::DuplicatePending => ReviewError::DuplicatePending,
            AdmissionError::RateExceeded => ReviewError::RateExceeded,
            AdmissionError::Store(e) => ReviewError::StorageError(e.to_string()),
        }
    }
}

pub struct ReviewService<S: ReviewStore> {
    store: S,
    gate: AdmissionGate<S>,
    hub: Arc<NotificationHub>,
}

impl<S: ReviewStore> ReviewService<S> {
    pub fn new(store: S, gate: AdmissionGate<S>, hub: Arc<NotificationHub>) -> Self {
        Self { store, gate, hub }
    }

    /// Accepts a submission into the moderation queue.
    ///
    /// The rating must be an integer in 1..=5 (a missing or non-integer
    /// rating arrives as None and fails the same way). The created review
    /// always starts out pending; connected admins are notified best-effort.
    pub async fn submit(
        &self,
        user: &UserIdentity,
        input: SubmitReview,
    ) -> Result<Review, ReviewError> {
        let rating = match input.rating {
            Some(r @ 1..=5) => r as u8,
            _ => return Err(ReviewError::InvalidRating),
        };

        let body = input.review.unwrap_or_default().trim().to_string();
        if body.chars().count() > MAX_REVIEW_CHARS {
            return Err(ReviewError::ReviewTooLong);
        }

        self.gate.admit(&user.id).await?;

        let now = Utc::now();
        let review = Review {
            id: Uuid::new_v4(),
            user_id: user.id.clone(),
            user_name: display_name(user),
            user_email: user.email.clone(),
            rating,
            review: body,
            app_store: input.app_store.unwrap_or_default(),
            status: ReviewStatus::Pending,
            is_featured: false,
            helpful_votes: 0,
            unhelpful_votes: 0,
            report_count: 0,
            admin_response: None,
            flags: Vec::new(),
            device_info: input.device_info,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
        };

        self.store.create_review(&review).await?;

        tracing::info!(
            review = %review.id,
            user = %review.user_id,
            rating = review.rating,
            "review submitted"
        );

        self.hub
            .broadcast_new_submission(ReviewSummary::from_review(&review));

        Ok(review)
    }

    /// Approved reviews plus the aggregate rating stats shown next to them.
    pub async fn public_reviews(
        &self,
        query: &PublicReviewQuery,
    ) -> Result<(Page<Review>, RatingSummary), ReviewError> {
        let page = self.store.list_public(query).await?;
        let mut summary = self.store.rating_summary().await?;
        summary.average_rating = round_to(summary.average_rating, 1);
        Ok((page, summary))
    }

    /// The moderation queue, newest first.
    pub async fn pending_reviews(&self, page: u32, limit: u32) -> Result<Page<Review>, ReviewError> {
        Ok(self.store.list_pending(page, limit).await?)
    }

    pub async fn statistics(&self) -> Result<ReviewStatistics, ReviewError> {
        let mut stats = self.store.statistics().await?;
        stats.average_rating = round_to(stats.average_rating, 2);
        Ok(stats)
    }

    /// Store reachability, reported on the health endpoint.
    pub async fn store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}

/// Display name snapshot: the profile name, or the email local part when the
/// profile has none.
fn display_name(user: &UserIdentity) -> String {
    if !user.name.trim().is_empty() {
        return user.name.clone();
    }
    user.email
        .split('@')
        .next()
        .unwrap_or(user.email.as_str())
        .to_string()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
