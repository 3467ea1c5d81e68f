// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "reviews/mod.rs"]
pub mod reviews;

#[path = "notifications/mod.rs"]
pub mod notifications;

#[path = "analytics/mod.rs"]
pub mod analytics;
