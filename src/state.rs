// Shared application state handed to every handler.

use crate::core::analytics::ShareService;
use crate::core::notifications::NotificationHub;
use crate::core::reviews::{ModerationService, ReviewService, VoteService};
use crate::http::auth::AuthConfig;
use crate::http::rate_limit::SlidingWindowLimiter;
use crate::infra::analytics::SqliteShareStore;
use crate::infra::reviews::SqliteReviewStore;
use std::sync::Arc;

pub struct AppState {
    pub reviews: ReviewService<SqliteReviewStore>,
    pub moderation: ModerationService<SqliteReviewStore>,
    pub votes: VoteService<SqliteReviewStore>,
    pub shares: ShareService<SqliteShareStore>,
    pub hub: Arc<NotificationHub>,
    pub auth: AuthConfig,
    pub review_limiter: SlidingWindowLimiter,
    pub share_limiter: SlidingWindowLimiter,
    /// Whether X-Forwarded-For comes from a proxy we control.
    pub trust_proxy: bool,
}
