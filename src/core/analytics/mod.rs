// Core analytics module - share tracking and aggregates.

pub mod share_models;
pub mod share_service;

pub use share_models::*;
pub use share_service::*;
