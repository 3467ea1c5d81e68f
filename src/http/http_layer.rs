// The http module is the REST transport: routing, auth, rate limiting,
// and the error-to-status mapping.

#[path = "auth.rs"]
pub mod auth;

#[path = "error.rs"]
pub mod error;

#[path = "handlers.rs"]
pub mod handlers;

#[path = "rate_limit.rs"]
pub mod rate_limit;

#[path = "routes.rs"]
pub mod routes;
