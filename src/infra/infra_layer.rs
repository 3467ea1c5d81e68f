// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "reviews/mod.rs"]
pub mod reviews;

#[path = "analytics/mod.rs"]
pub mod analytics;
