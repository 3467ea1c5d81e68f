// This is the entry point of the review service.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (SQLite stores)
// - `http/` = REST adapters (routes, auth, rate limits)
// - `ws/` = WebSocket adapter over the notification hub
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Assemble the router
// 4. Serve

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;
#[path = "ws/ws_layer.rs"]
mod ws;

mod state;

use crate::core::analytics::ShareService;
use crate::core::notifications::NotificationHub;
use crate::core::reviews::{AdmissionGate, ModerationService, ReviewService, VoteService};
use crate::http::auth::AuthConfig;
use crate::http::rate_limit::SlidingWindowLimiter;
use crate::http::routes;
use crate::infra::analytics::SqliteShareStore;
use crate::infra::reviews::SqliteReviewStore;
use crate::state::AppState;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;

const DEFAULT_PORT: u16 = 10000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        tracing::warn!("JWT_SECRET not set, using the development fallback secret");
        "app-reviews-fallback-secret-2024".to_string()
    });

    let port = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    // Only honor X-Forwarded-For when deployed behind our own proxy.
    let trust_proxy = std::env::var("TRUST_PROXY")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).context("Failed to create data directory")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let review_store = SqliteReviewStore::new(&format!("{data_dir}/reviews.db"))
        .await
        .context("Failed to initialize review store")?;
    let share_store = SqliteShareStore::new(&format!("{data_dir}/shares.db"))
        .await
        .context("Failed to initialize share store")?;

    let hub = Arc::new(NotificationHub::new());

    let gate = AdmissionGate::new(review_store.clone());
    let reviews = ReviewService::new(review_store.clone(), gate, Arc::clone(&hub));
    let moderation = ModerationService::new(review_store.clone(), Arc::clone(&hub));
    let votes = VoteService::new(review_store);
    let shares = ShareService::new(share_store);

    let state = Arc::new(AppState {
        reviews,
        moderation,
        votes,
        shares,
        hub,
        auth: AuthConfig::new(&jwt_secret),
        review_limiter: SlidingWindowLimiter::for_reviews(),
        share_limiter: SlidingWindowLimiter::for_shares(),
        trust_proxy,
    });

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "review service listening");

    // ConnectInfo feeds the per-IP rate limiters.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
