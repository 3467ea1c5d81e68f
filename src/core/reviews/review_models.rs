// Review domain models - data structures for the moderation workflow.
//
// These are pure domain types with no HTTP or WebSocket dependencies.
// The transport layers convert these to wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Maximum review body length after trimming, in characters.
pub const MAX_REVIEW_CHARS: usize = 2000;

/// Maximum admin response length after trimming, in characters.
pub const MAX_ADMIN_RESPONSE_CHARS: usize = 1000;

/// An authenticated identity as yielded by token verification.
///
/// The auth layer is a thin capability: it hands us an id, a display
/// snapshot, and a role. Everything else about accounts lives elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

impl UserIdentity {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Lifecycle status of a review. A review has exactly one status at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }

    /// Transition table for admin decisions.
    ///
    /// Total over every (state, action) pair: a review may be re-decided an
    /// unbounded number of times, so there is no illegal transition here.
    /// Re-decidability is a deliberate part of the contract (and pinned by
    /// tests), not a missing guard.
    pub fn decide(self, action: DecisionAction) -> ReviewStatus {
        match (self, action) {
            (_, DecisionAction::Approve) => ReviewStatus::Approved,
            (_, DecisionAction::Reject) => ReviewStatus::Rejected,
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admin decision on a pending (or previously decided) review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    Approve,
    Reject,
}

impl DecisionAction {
    /// Parses the wire status value. Anything but "approved"/"rejected"
    /// is not a decision.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "approved" => Some(DecisionAction::Approve),
            "rejected" => Some(DecisionAction::Reject),
            _ => None,
        }
    }
}

/// Known distribution channels a review can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AppStoreChannel {
    GooglePlay,
    AppleStore,
    Huawei,
    Samsung,
    #[default]
    Web,
}

impl AppStoreChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStoreChannel::GooglePlay => "google-play",
            AppStoreChannel::AppleStore => "apple-store",
            AppStoreChannel::Huawei => "huawei",
            AppStoreChannel::Samsung => "samsung",
            AppStoreChannel::Web => "web",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "google-play" => Some(AppStoreChannel::GooglePlay),
            "apple-store" => Some(AppStoreChannel::AppleStore),
            "huawei" => Some(AppStoreChannel::Huawei),
            "samsung" => Some(AppStoreChannel::Samsung),
            "web" => Some(AppStoreChannel::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppStoreChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response attached by an admin while deciding a review. At most one per
/// review; a redecision with new text overwrites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminResponse {
    pub text: String,
    pub responded_by: String,
    pub responded_at: DateTime<Utc>,
}

/// A user report against a review. Flags are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFlag {
    pub user_id: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Client device details captured at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_type: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub user_agent: Option<String>,
}

/// Request-scoped metadata captured at creation, immutable thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewMetadata {
    pub ip_address: Option<String>,
    pub session_id: Option<String>,
}

/// A user-submitted rating/review held in the moderation queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub user_id: String,
    /// Display name snapshot taken at submission time.
    pub user_name: String,
    pub user_email: String,
    /// Integer rating, 1 through 5.
    pub rating: u8,
    /// Free-text body, trimmed, may be empty.
    pub review: String,
    pub app_store: AppStoreChannel,
    pub status: ReviewStatus,
    pub is_featured: bool,
    pub helpful_votes: i64,
    pub unhelpful_votes: i64,
    pub report_count: i64,
    pub admin_response: Option<AdminResponse>,
    pub flags: Vec<ReviewFlag>,
    pub device_info: DeviceInfo,
    pub metadata: ReviewMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated submission input, produced by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct SubmitReview {
    /// None when the client sent no rating or a non-integer rating.
    pub rating: Option<i64>,
    pub review: Option<String>,
    pub app_store: Option<AppStoreChannel>,
    pub device_info: DeviceInfo,
    pub metadata: ReviewMetadata,
}

/// Fields written by a single admin decision.
///
/// The store applies this blindly (last write wins on concurrent decisions
/// for the same id - there is no optimistic-concurrency token).
/// `admin_response: None` means "leave any prior response untouched", never
/// "clear it".
#[derive(Debug, Clone)]
pub struct DecisionUpdate {
    pub status: ReviewStatus,
    /// True when transitioning into Approved: an approved review is never
    /// auto-featured.
    pub reset_featured: bool,
    pub admin_response: Option<AdminResponse>,
}

/// Sort fields accepted by the public listing. Acts as a whitelist so
/// arbitrary column names never reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Rating,
    HelpfulVotes,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" => Some(SortField::CreatedAt),
            "rating" => Some(SortField::Rating),
            "helpfulVotes" => Some(SortField::HelpfulVotes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

/// Filters and paging for the public (approved-only) listing.
#[derive(Debug, Clone, Default)]
pub struct PublicReviewQuery {
    pub rating: Option<u8>,
    pub app_store: Option<AppStoreChannel>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// One page of store results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total: i64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            (total + i64::from(limit) - 1) / i64::from(limit)
        };
        Self {
            items,
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Aggregate rating stats over approved reviews.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average_rating: f64,
    pub total_reviews: i64,
    /// Count per star value, keys "1" through "5".
    pub rating_distribution: BTreeMap<u8, i64>,
}

impl RatingSummary {
    pub fn empty() -> Self {
        Self {
            average_rating: 0.0,
            total_reviews: 0,
            rating_distribution: empty_distribution(),
        }
    }
}

/// Distribution map with every star bucket present, all zero.
pub fn empty_distribution() -> BTreeMap<u8, i64> {
    (1..=5).map(|star| (star, 0)).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCount {
    pub app_store: AppStoreChannel,
    pub count: i64,
}

/// Service-wide counters for the statistics endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStatistics {
    pub total_reviews: i64,
    pub pending_reviews: i64,
    pub approved_reviews: i64,
    pub rejected_reviews: i64,
    pub average_rating: f64,
    pub rating_distribution: BTreeMap<u8, i64>,
    /// Top approved reviews by helpful votes.
    pub recent_reviews: Vec<Review>,
    pub top_platforms: Vec<PlatformCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_is_total_over_every_state() {
        for current in [
            ReviewStatus::Pending,
            ReviewStatus::Approved,
            ReviewStatus::Rejected,
        ] {
            assert_eq!(
                current.decide(DecisionAction::Approve),
                ReviewStatus::Approved
            );
            assert_eq!(
                current.decide(DecisionAction::Reject),
                ReviewStatus::Rejected
            );
        }
    }

    #[test]
    fn decision_parse_rejects_non_decisions() {
        assert_eq!(DecisionAction::parse("approved"), Some(DecisionAction::Approve));
        assert_eq!(DecisionAction::parse("rejected"), Some(DecisionAction::Reject));
        assert_eq!(DecisionAction::parse("pending"), None);
        assert_eq!(DecisionAction::parse("APPROVED"), None);
        assert_eq!(DecisionAction::parse(""), None);
    }

    #[test]
    fn app_store_round_trips_and_defaults_to_web() {
        for channel in [
            AppStoreChannel::GooglePlay,
            AppStoreChannel::AppleStore,
            AppStoreChannel::Huawei,
            AppStoreChannel::Samsung,
            AppStoreChannel::Web,
        ] {
            assert_eq!(AppStoreChannel::parse(channel.as_str()), Some(channel));
        }
        assert_eq!(AppStoreChannel::parse("itch-io"), None);
        assert_eq!(AppStoreChannel::default(), AppStoreChannel::Web);
    }

    #[test]
    fn page_math_rounds_up() {
        let page: Page<u8> = Page::new(vec![], 1, 10, 21);
        assert_eq!(page.pages, 3);
        let page: Page<u8> = Page::new(vec![], 1, 10, 20);
        assert_eq!(page.pages, 2);
        let page: Page<u8> = Page::new(vec![], 1, 10, 0);
        assert_eq!(page.pages, 0);
    }
}
