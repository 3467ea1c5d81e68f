// In-memory review store backed by a concurrent map.
//
// Used by service tests and useful as a stand-in when no database is
// wanted. Clone is shallow: clones share the same map.

use crate::core::reviews::{
    empty_distribution, AppStoreChannel, DecisionUpdate, Page, PlatformCount, PublicReviewQuery,
    RatingSummary, Review, ReviewFlag, ReviewStatistics, ReviewStatus, ReviewStore, SortField,
    SortOrder, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryReviewStore {
    reviews: Arc<DashMap<Uuid, Review>>,
}

#[allow(dead_code)]
impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> Vec<Review> {
        self.reviews.iter().map(|e| e.value().clone()).collect()
    }
}

fn paginate(mut items: Vec<Review>, page: u32, limit: u32) -> Page<Review> {
    let total = items.len() as i64;
    let page = page.max(1);
    let limit = limit.max(1);
    // Widen before multiplying: page * limit can exceed u32.
    let offset = u64::from(page - 1) * u64::from(limit);
    let items = if offset >= items.len() as u64 {
        Vec::new()
    } else {
        items.drain(offset as usize..).take(limit as usize).collect()
    };
    Page::new(items, page, limit, total)
}

fn distribution_of(reviews: &[&Review]) -> BTreeMap<u8, i64> {
    let mut dist = empty_distribution();
    for review in reviews {
        *dist.entry(review.rating).or_insert(0) += 1;
    }
    dist
}

fn average_of(reviews: &[&Review]) -> f64 {
    if reviews.is_empty() {
        return 0.0;
    }
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    sum as f64 / reviews.len() as f64
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn create_review(&self, review: &Review) -> Result<(), StoreError> {
        self.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, StoreError> {
        Ok(self.reviews.get(&id).map(|r| r.clone()))
    }

    async fn has_pending_review(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .reviews
            .iter()
            .any(|r| r.user_id == user_id && r.status == ReviewStatus::Pending))
    }

    async fn count_reviews_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .count() as u64)
    }

    async fn apply_decision(
        &self,
        id: Uuid,
        update: DecisionUpdate,
    ) -> Result<Option<Review>, StoreError> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(None);
        };
        review.status = update.status;
        if update.reset_featured {
            review.is_featured = false;
        }
        if let Some(response) = update.admin_response {
            review.admin_response = Some(response);
        }
        review.updated_at = Utc::now();
        Ok(Some(review.clone()))
    }

    async fn increment_helpful_votes(&self, id: Uuid) -> Result<Option<i64>, StoreError> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(None);
        };
        review.helpful_votes += 1;
        review.updated_at = Utc::now();
        Ok(Some(review.helpful_votes))
    }

    async fn append_flag(&self, id: Uuid, flag: ReviewFlag) -> Result<Option<i64>, StoreError> {
        let Some(mut review) = self.reviews.get_mut(&id) else {
            return Ok(None);
        };
        review.flags.push(flag);
        review.report_count += 1;
        review.updated_at = Utc::now();
        Ok(Some(review.report_count))
    }

    async fn list_public(&self, query: &PublicReviewQuery) -> Result<Page<Review>, StoreError> {
        let mut matching: Vec<Review> = self
            .snapshot()
            .into_iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .filter(|r| query.rating.map_or(true, |want| r.rating == want))
            .filter(|r| query.app_store.map_or(true, |want| r.app_store == want))
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort_by {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::Rating => a.rating.cmp(&b.rating),
                SortField::HelpfulVotes => a.helpful_votes.cmp(&b.helpful_votes),
            };
            match query.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        Ok(paginate(matching, query.page, query.limit))
    }

    async fn rating_summary(&self) -> Result<RatingSummary, StoreError> {
        let all = self.snapshot();
        let approved: Vec<&Review> = all
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .collect();
        Ok(RatingSummary {
            average_rating: average_of(&approved),
            total_reviews: approved.len() as i64,
            rating_distribution: distribution_of(&approved),
        })
    }

    async fn list_pending(&self, page: u32, limit: u32) -> Result<Page<Review>, StoreError> {
        let mut pending: Vec<Review> = self
            .snapshot()
            .into_iter()
            .filter(|r| r.status == ReviewStatus::Pending)
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(pending, page, limit))
    }

    async fn statistics(&self) -> Result<ReviewStatistics, StoreError> {
        let all = self.snapshot();
        let approved: Vec<&Review> = all
            .iter()
            .filter(|r| r.status == ReviewStatus::Approved)
            .collect();

        let mut recent: Vec<Review> = approved.iter().map(|r| (*r).clone()).collect();
        recent.sort_by(|a, b| b.helpful_votes.cmp(&a.helpful_votes));
        recent.truncate(5);

        let mut by_platform: BTreeMap<&'static str, (AppStoreChannel, i64)> = BTreeMap::new();
        for review in &all {
            by_platform
                .entry(review.app_store.as_str())
                .or_insert((review.app_store, 0))
                .1 += 1;
        }
        let mut top_platforms: Vec<PlatformCount> = by_platform
            .into_values()
            .map(|(app_store, count)| PlatformCount { app_store, count })
            .collect();
        top_platforms.sort_by(|a, b| b.count.cmp(&a.count));
        top_platforms.truncate(5);

        Ok(ReviewStatistics {
            total_reviews: all.len() as i64,
            pending_reviews: all
                .iter()
                .filter(|r| r.status == ReviewStatus::Pending)
                .count() as i64,
            approved_reviews: approved.len() as i64,
            rejected_reviews: all
                .iter()
                .filter(|r| r.status == ReviewStatus::Rejected)
                .count() as i64,
            average_rating: average_of(&approved),
            rating_distribution: distribution_of(&approved),
            recent_reviews: recent,
            top_platforms,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
