// The ws module is the WebSocket transport over the notification hub.

#[path = "handler.rs"]
pub mod handler;
