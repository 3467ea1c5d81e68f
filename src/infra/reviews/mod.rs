// Review store implementations.

pub mod memory_store;
pub mod sqlite_review_store;

pub use memory_store::InMemoryReviewStore;
pub use sqlite_review_store::SqliteReviewStore;
