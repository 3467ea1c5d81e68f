// Notification domain models - rooms and the event vocabulary.
//
// Server events are the only things that travel hub -> connection; client
// events are what the WebSocket layer accepts from connections. Both are
// adjacently tagged so the wire shape is {"event": "...", "data": {...}},
// with the event names the frontend already speaks.

use crate::core::reviews::review_models::{AdminResponse, Review, ReviewStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named logical broadcast group that connections join and leave.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Every connected administrator.
    Admin,
    /// The private per-identity channel, `user_<id>`.
    User(String),
}

impl Room {
    pub fn user(id: impl Into<String>) -> Self {
        Room::User(id.into())
    }
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::Admin => f.write_str("admin"),
            Room::User(id) => write!(f, "user_{id}"),
        }
    }
}

/// Compact review details broadcast to the admin room on submission.
///
/// `review_id` is absent on the lightweight WebSocket echo path, where no
/// review record has been created yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub review_id: Option<Uuid>,
    pub user_id: String,
    pub user_name: String,
    pub rating: Option<u8>,
    pub review: Option<String>,
}

impl ReviewSummary {
    pub fn from_review(review: &Review) -> Self {
        Self {
            review_id: Some(review.id),
            user_id: review.user_id.clone(),
            user_name: review.user_name.clone(),
            rating: Some(review.rating),
            review: Some(review.review.clone()),
        }
    }
}

/// Events pushed from the hub to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// A review entered the moderation queue (admin room).
    NewReviewNotification {
        summary: ReviewSummary,
        timestamp: DateTime<Utc>,
    },
    /// The submitter's review was approved (private channel).
    ReviewApproved {
        review_id: Uuid,
        message: String,
        admin_response: Option<AdminResponse>,
        timestamp: DateTime<Utc>,
    },
    /// The submitter's review was rejected (private channel).
    ReviewRejected {
        review_id: Uuid,
        message: String,
        admin_response: Option<AdminResponse>,
        timestamp: DateTime<Utc>,
    },
    /// Acknowledgement on the WebSocket echo submission path.
    ReviewSubmitted { success: bool, message: String },
    /// An admin is composing a response (admin room, sender excluded).
    AdminTyping {
        admin_id: String,
        admin_name: String,
        review_id: String,
        is_typing: bool,
        timestamp: DateTime<Utc>,
    },
    /// Admin presence, broadcast process-wide.
    AdminOnline {
        admin_id: String,
        admin_name: String,
        timestamp: DateTime<Utc>,
    },
    AdminOffline {
        admin_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl ServerEvent {
    /// The decision event for the submitter's private channel. Fire-and-
    /// forget: whether anyone is connected to receive it is not the
    /// decision's concern.
    pub fn decision(review: &Review) -> ServerEvent {
        match review.status {
            ReviewStatus::Rejected => ServerEvent::ReviewRejected {
                review_id: review.id,
                message: "Your review did not meet our guidelines".to_string(),
                admin_response: review.admin_response.clone(),
                timestamp: Utc::now(),
            },
            // Pending is unreachable off a decision, but mapping it like an
            // approval keeps this constructor total.
            ReviewStatus::Approved | ReviewStatus::Pending => ServerEvent::ReviewApproved {
                review_id: review.id,
                message: "Your review has been approved and is now visible to the public"
                    .to_string(),
                admin_response: review.admin_response.clone(),
                timestamp: Utc::now(),
            },
        }
    }
}

/// A draft carried on the WebSocket echo submission path. Not validated and
/// not persisted; the REST endpoint is the authoritative path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDraft {
    pub rating: Option<i64>,
    pub review: Option<String>,
}

/// Events accepted from connected clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Lightweight echo/ack path; does not create a review.
    SubmitReview {
        #[serde(default)]
        review_data: ReviewDraft,
    },
    /// Admin-issued relay: tell a submitter their review was approved.
    ApproveReview { review_id: Uuid, user_id: String },
    /// Admin-issued relay: tell a submitter their review was rejected.
    RejectReview {
        review_id: Uuid,
        user_id: String,
        reason: Option<String>,
    },
    /// Typing indicator for admin responses.
    TypingResponse { review_id: String, is_typing: bool },
    /// Client announces presence; meaningful for admins only.
    UserOnline,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rooms_render_their_wire_names() {
        assert_eq!(Room::Admin.to_string(), "admin");
        assert_eq!(Room::user("abc").to_string(), "user_abc");
    }

    #[test]
    fn server_events_use_the_frontend_names() {
        let event = ServerEvent::AdminOffline {
            admin_id: "a1".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "adminOffline");
        assert_eq!(json["data"]["adminId"], "a1");
    }

    #[test]
    fn client_events_parse_from_the_wire_shape() {
        let msg = r#"{"event":"typingResponse","data":{"reviewId":"r-9","isTyping":true}}"#;
        let event: ClientEvent = serde_json::from_str(msg).unwrap();
        assert!(matches!(
            event,
            ClientEvent::TypingResponse { ref review_id, is_typing: true } if review_id == "r-9"
        ));

        let msg = r#"{"event":"userOnline"}"#;
        assert!(matches!(
            serde_json::from_str::<ClientEvent>(msg).unwrap(),
            ClientEvent::UserOnline
        ));
    }
}
