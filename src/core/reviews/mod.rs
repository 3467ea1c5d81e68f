// Core reviews module - the moderation workflow.
// Models, the store port, and one service per concern.

pub mod admission_service;
pub mod moderation_service;
pub mod review_models;
pub mod review_service;
pub mod review_store;
pub mod vote_service;

pub use admission_service::*;
pub use moderation_service::*;
pub use review_models::*;
pub use review_service::*;
pub use review_store::*;
pub use vote_service::*;
