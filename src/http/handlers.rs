// REST handlers.
//
// Handlers stay thin: authenticate, rate-limit, convert the wire payload,
// call the service, shape the envelope. Every success body carries
// "success": true and errors are mapped in error.rs.

use crate::core::analytics::{ShareAnalyticsQuery, ShareGroupBy, SharePlatform, TrackShare};
use crate::core::reviews::{
    AppStoreChannel, DeviceInfo, PublicReviewQuery, Review, ReviewMetadata, SortField, SortOrder,
    SubmitReview,
};
use crate::http::error::ApiError;
use crate::state::AppState;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_PUBLIC_LIMIT: u32 = 10;
const DEFAULT_PENDING_LIMIT: u32 = 20;

/// Source IP for rate limiting. X-Forwarded-For is client-controlled, so it
/// only counts when TRUST_PROXY says a proxy we trust sets it; otherwise a
/// direct client could rotate the header past the limiters.
fn client_ip(headers: &HeaderMap, addr: &SocketAddr, trust_proxy: bool) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            return forwarded;
        }
    }
    addr.ip().to_string()
}

fn review_id_from(path: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(path).map_err(|_| ApiError::new(StatusCode::NOT_FOUND, "Review not found"))
}

/// Public projection of a review. Flags and reporter identities never leave
/// the service; the submitter email stays private too.
fn review_json(review: &Review) -> serde_json::Value {
    json!({
        "id": review.id,
        "userName": review.user_name,
        "rating": review.rating,
        "review": review.review,
        "appStore": review.app_store,
        "status": review.status,
        "isFeatured": review.is_featured,
        "helpfulVotes": review.helpful_votes,
        "reportCount": review.report_count,
        "adminResponse": review.admin_response,
        "createdAt": review.created_at,
        "updatedAt": review.updated_at,
    })
}

fn pagination_json(page: u32, limit: u32, total: i64, pages: i64) -> serde_json::Value {
    json!({ "page": page, "limit": limit, "total": total, "pages": pages })
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewBody {
    /// Raw JSON so a string or fractional rating degrades to "no rating"
    /// instead of a deserialization failure.
    rating: Option<serde_json::Value>,
    review: Option<String>,
    app_store: Option<String>,
    #[serde(default)]
    device_info: DeviceInfo,
    session_id: Option<String>,
}

pub async fn submit_review(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<SubmitReviewBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.authenticate(&headers)?;

    let ip = client_ip(&headers, &addr, state.trust_proxy);
    if !user.is_admin() && !state.review_limiter.allow(&ip) {
        return Err(ApiError::too_many_requests(
            "Too many review submissions from this IP. Please try again later.",
        ));
    }

    let app_store = match body.app_store.as_deref() {
        Some(raw) => Some(
            AppStoreChannel::parse(raw)
                .ok_or_else(|| ApiError::bad_request("Please provide a valid app store"))?,
        ),
        None => None,
    };

    let input = SubmitReview {
        rating: body.rating.and_then(|v| v.as_i64()),
        review: body.review,
        app_store,
        device_info: body.device_info,
        metadata: ReviewMetadata {
            ip_address: Some(ip),
            session_id: body
                .session_id
                .or_else(|| headers.get("x-session-id").and_then(|v| v.to_str().ok()).map(String::from)),
        },
    };

    let review = state.reviews.submit(&user, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Review submitted successfully. It will be visible after admin approval.",
            "review": review_json(&review),
        })),
    ))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicListingParams {
    rating: Option<String>,
    app_store: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

pub async fn get_public_reviews(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PublicListingParams>,
) -> Result<impl IntoResponse, ApiError> {
    // The public listing has no error cases: unknown filter or sort values
    // fall back to defaults instead of rejecting the request.
    let query = PublicReviewQuery {
        rating: params
            .rating
            .as_deref()
            .and_then(|r| r.parse::<u8>().ok())
            .filter(|r| (1..=5).contains(r)),
        app_store: params.app_store.as_deref().and_then(AppStoreChannel::parse),
        sort_by: params
            .sort_by
            .as_deref()
            .and_then(SortField::parse)
            .unwrap_or_default(),
        sort_order: match params.sort_order.as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        },
        page: params.page.unwrap_or(1).max(1),
        limit: params.limit.unwrap_or(DEFAULT_PUBLIC_LIMIT).clamp(1, 100),
    };

    let (page, stats) = state.reviews.public_reviews(&query).await?;

    Ok(Json(json!({
        "success": true,
        "reviews": page.items.iter().map(review_json).collect::<Vec<_>>(),
        "pagination": pagination_json(page.page, page.limit, page.total, page.pages),
        "stats": stats,
    })))
}

#[derive(Debug, Deserialize, Default)]
pub struct PagingParams {
    page: Option<u32>,
    limit: Option<u32>,
}

pub async fn get_pending_reviews(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<PagingParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.require_admin(&headers)?;

    let page_no = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PENDING_LIMIT).clamp(1, 100);
    let page = state.reviews.pending_reviews(page_no, limit).await?;

    Ok(Json(json!({
        "success": true,
        // The moderation queue includes submitter contact details.
        "reviews": page.items,
        "pagination": pagination_json(page.page, page.limit, page.total, page.pages),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBody {
    status: Option<String>,
    admin_response: Option<String>,
}

pub async fn update_review_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DecisionBody>,
) -> Result<impl IntoResponse, ApiError> {
    let admin = state.auth.require_admin(&headers)?;
    let review_id = review_id_from(&id)?;

    let review = state
        .moderation
        .decide(
            review_id,
            body.status.as_deref().unwrap_or_default(),
            &admin,
            body.admin_response.as_deref(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Review {} successfully", review.status),
        "review": review_json(&review),
    })))
}

pub async fn mark_helpful(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.authenticate(&headers)?;
    let review_id = review_id_from(&id)?;

    let helpful_votes = state.votes.mark_helpful(review_id, &user).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Thank you for your feedback",
        "helpfulVotes": helpful_votes,
    })))
}

#[derive(Debug, Deserialize, Default)]
pub struct ReportBody {
    reason: Option<String>,
}

pub async fn report_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<ReportBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.authenticate(&headers)?;
    let review_id = review_id_from(&id)?;

    let report_count = state.votes.report(review_id, &user, body.reason).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Review reported successfully",
        "reportCount": report_count,
    })))
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

pub async fn track_share(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(mut body): Json<TrackShare>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.authenticate(&headers)?;

    let ip = client_ip(&headers, &addr, state.trust_proxy);
    if !state.share_limiter.allow(&ip) {
        return Err(ApiError::too_many_requests(
            "Too many share events from this IP. Please try again later.",
        ));
    }

    // The verified identity wins over whatever the client claims.
    body.user_id = Some(user.id.clone());
    if body.user_name.is_none() {
        body.user_name = Some(user.name.clone());
    }
    if body.user_email.is_none() {
        body.user_email = Some(user.email.clone());
    }

    let (_, total_shares) = state.shares.track(body, Some(ip)).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Share tracked successfully",
        "totalShares": total_shares,
    })))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ShareAnalyticsParams {
    start_date: Option<String>,
    end_date: Option<String>,
    platform: Option<String>,
    group_by: Option<String>,
}

/// Accepts RFC 3339 or plain `YYYY-MM-DD`. Bare end dates extend to the end
/// of that day so a single-day range covers the whole day.
fn parse_date(raw: &str, end_of_day: bool) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = raw.parse::<NaiveDate>().ok()?;
    let time = if end_of_day {
        date.and_hms_opt(23, 59, 59)?
    } else {
        date.and_hms_opt(0, 0, 0)?
    };
    Some(DateTime::from_naive_utc_and_offset(time, Utc))
}

pub async fn get_share_analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ShareAnalyticsParams>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.require_admin(&headers)?;

    let query = ShareAnalyticsQuery {
        start: params.start_date.as_deref().and_then(|d| parse_date(d, false)),
        end: params.end_date.as_deref().and_then(|d| parse_date(d, true)),
        platform: params.platform.as_deref().and_then(SharePlatform::parse),
        group_by: params
            .group_by
            .as_deref()
            .and_then(ShareGroupBy::parse)
            .unwrap_or_default(),
    };

    let (rows, summary) = state.shares.analytics(&query).await?;

    Ok(Json(json!({
        "success": true,
        "analytics": rows,
        "summary": summary,
    })))
}

// ---------------------------------------------------------------------------
// Stats and health
// ---------------------------------------------------------------------------

pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.reviews.statistics().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = if state.reviews.store_healthy().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "success": true,
        "service": "app-review-service",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "database": database,
    }))
}
