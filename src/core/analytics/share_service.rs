// Share tracking and aggregate analytics.
//
// Recording is append-only and always succeeds for well-formed input; the
// read side groups counts by time bucket and platform for the dashboard.

use crate::core::analytics::share_models::{
    ShareAnalyticsQuery, ShareAnalyticsRow, ShareAnalyticsSummary, ShareDeviceInfo, ShareEvent,
    ShareLocation, ShareMethod, SharePlatform,
};
use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Please provide a valid share platform")]
    InvalidPlatform,

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Persistence port for share events.
#[async_trait]
pub trait ShareStore: Send + Sync {
    async fn record_share(&self, event: &ShareEvent) -> Result<(), ShareError>;
    async fn total_shares(&self) -> Result<i64, ShareError>;
    async fn grouped_analytics(
        &self,
        query: &ShareAnalyticsQuery,
    ) -> Result<Vec<ShareAnalyticsRow>, ShareError>;
    async fn unique_users(&self, query: &ShareAnalyticsQuery) -> Result<i64, ShareError>;
}

/// What a client reports when the user shares the app.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackShare {
    pub platform: Option<String>,
    #[serde(default)]
    pub share_method: Option<String>,
    pub shared_url: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    #[serde(default)]
    pub device_info: ShareDeviceInfo,
    pub session_id: Option<String>,
    pub referrer: Option<String>,
    pub campaign: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct ShareService<S: ShareStore> {
    store: S,
}

impl<S: ShareStore> ShareService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records one share event. The platform string must name a known
    /// platform; an unknown method falls back to the default. Returns the
    /// running total of shares after the insert.
    pub async fn track(
        &self,
        input: TrackShare,
        ip_address: Option<String>,
    ) -> Result<(ShareEvent, i64), ShareError> {
        let platform = input
            .platform
            .as_deref()
            .and_then(SharePlatform::parse)
            .ok_or(ShareError::InvalidPlatform)?;

        let share_method = input
            .share_method
            .as_deref()
            .and_then(ShareMethod::parse)
            .unwrap_or_default();

        let event = ShareEvent {
            id: Uuid::new_v4(),
            user_id: input.user_id.filter(|id| !id.trim().is_empty()),
            user_name: input.user_name,
            user_email: input.user_email,
            platform,
            share_method,
            shared_url: input
                .shared_url
                .filter(|u| !u.trim().is_empty())
                .or_else(|| input.referrer.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            device_info: input.device_info,
            location: ShareLocation {
                ip_address,
                ..ShareLocation::default()
            },
            session_id: input.session_id,
            referrer: input.referrer,
            campaign: input.campaign,
            tags: input.tags,
            success: true,
            error: None,
            created_at: Utc::now(),
        };

        self.store.record_share(&event).await?;

        tracing::info!(share = %event.id, platform = %event.platform, "share tracked");

        let total = self.store.total_shares().await?;
        Ok((event, total))
    }

    /// Grouped counts plus the overall summary for the requested window.
    pub async fn analytics(
        &self,
        query: &ShareAnalyticsQuery,
    ) -> Result<(Vec<ShareAnalyticsRow>, ShareAnalyticsSummary), ShareError> {
        let rows = self.store.grouped_analytics(query).await?;
        let unique_users = self.store.unique_users(query).await?;

        let summary = ShareAnalyticsSummary {
            total_shares: rows.iter().map(|r| r.count).sum(),
            unique_users,
            start_date: query
                .start
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "beginning".to_string()),
            end_date: query
                .end
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "now".to_string()),
        };

        Ok((rows, summary))
    }
}
