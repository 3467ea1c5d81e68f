// Core notifications module - live connections and event fan-out.

pub mod notification_hub;
pub mod notification_models;

pub use notification_hub::*;
pub use notification_models::*;
