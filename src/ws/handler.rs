// WebSocket transport: handshake auth, connection lifecycle against the
// hub, and client-event dispatch.
//
// The socket task owns the transport only. Room membership and routing live
// in the hub; this file converts frames to client events and server events
// to frames.

use crate::core::notifications::{ClientEvent, ConnectionId, NotificationHub, ReviewSummary, Room, ServerEvent};
use crate::http::error::ApiError;
use crate::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    token: Option<String>,
}

/// Upgrade endpoint. The token travels in the query string (browser
/// WebSocket clients cannot set headers) or the Authorization header;
/// verification happens before the upgrade completes.
pub async fn ws_upgrade(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let identity = match query.token.as_deref() {
        Some(token) => state.auth.verify_token(token)?,
        None => state.auth.authenticate(&headers)?,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    identity: crate::core::reviews::UserIdentity,
) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let conn = match state.hub.connect(identity, tx) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::warn!(error = %err, "socket registration refused");
            let _ = sink.close().await;
            return;
        }
    };

    // Hub -> socket. Ends when the hub drops the sender or the peer goes
    // away; serialization of our own event type does not fail.
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(json) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Socket -> hub.
    loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(event) => dispatch(&state.hub, conn, event),
                            Err(err) => {
                                tracing::debug!(error = %err, "ignoring malformed client event")
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        tracing::debug!(error = %err, "socket read failed");
                        break;
                    }
                }
            }
            _ = &mut send_task => break,
        }
    }

    state.hub.disconnect(conn);
    send_task.abort();
}

/// Routes one client event. Connection identity is re-read from the hub so
/// a dispatch after disconnect is a no-op.
fn dispatch(hub: &NotificationHub, conn: ConnectionId, event: ClientEvent) {
    let Some(sender) = hub.identity(conn) else {
        return;
    };

    match event {
        // Echo path: no review is created, admins get a lightweight heads-up
        // and the submitter gets an ack. The REST endpoint is authoritative.
        ClientEvent::SubmitReview { review_data } => {
            hub.publish(
                &Room::Admin,
                ServerEvent::NewReviewNotification {
                    summary: ReviewSummary {
                        review_id: None,
                        user_id: sender.id.clone(),
                        user_name: sender.name.clone(),
                        rating: review_data.rating.and_then(|r| u8::try_from(r).ok()),
                        review: review_data.review,
                    },
                    timestamp: Utc::now(),
                },
            );
            hub.send_to(
                conn,
                ServerEvent::ReviewSubmitted {
                    success: true,
                    message: "Review submitted for moderation".to_string(),
                },
            );
        }
        ClientEvent::ApproveReview { review_id, user_id } => {
            if !sender.is_admin() {
                return;
            }
            hub.notify_decision(
                &user_id,
                ServerEvent::ReviewApproved {
                    review_id,
                    message: "Your review has been approved and is now visible to the public"
                        .to_string(),
                    admin_response: None,
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::RejectReview {
            review_id,
            user_id,
            reason,
        } => {
            if !sender.is_admin() {
                return;
            }
            hub.notify_decision(
                &user_id,
                ServerEvent::ReviewRejected {
                    review_id,
                    message: reason
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| "Your review did not meet our guidelines".to_string()),
                    admin_response: None,
                    timestamp: Utc::now(),
                },
            );
        }
        ClientEvent::TypingResponse {
            review_id,
            is_typing,
        } => hub.relay_typing(conn, &review_id, is_typing),
        ClientEvent::UserOnline => hub.mark_online(conn),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::notifications::ReviewDraft;
    use crate::core::reviews::{UserIdentity, UserRole};
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    fn connect(
        hub: &NotificationHub,
        id: &str,
        role: UserRole,
    ) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = hub
            .connect(
                UserIdentity {
                    id: id.to_string(),
                    name: format!("Name of {id}"),
                    email: format!("{id}@example.com"),
                    role,
                },
                tx,
            )
            .unwrap();
        (conn, rx)
    }

    #[tokio::test]
    async fn echo_submission_notifies_admins_and_acks_the_sender() {
        let hub = NotificationHub::new();
        let (_admin, mut rx_admin) = connect(&hub, "admin-1", UserRole::Admin);
        let (user_conn, mut rx_user) = connect(&hub, "user-1", UserRole::User);
        rx_admin.try_recv().ok();
        rx_user.try_recv().ok();

        dispatch(
            &hub,
            user_conn,
            ClientEvent::SubmitReview {
                review_data: ReviewDraft {
                    rating: Some(4),
                    review: Some("Nice".to_string()),
                },
            },
        );

        match rx_admin.try_recv().unwrap() {
            ServerEvent::NewReviewNotification { summary, .. } => {
                assert_eq!(summary.review_id, None);
                assert_eq!(summary.user_id, "user-1");
                assert_eq!(summary.rating, Some(4));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            rx_user.try_recv().unwrap(),
            ServerEvent::ReviewSubmitted { success: true, .. }
        ));
    }

    #[tokio::test]
    async fn decision_relays_are_admin_only() {
        let hub = NotificationHub::new();
        let (admin_conn, _rx_admin) = connect(&hub, "admin-1", UserRole::Admin);
        let (user_conn, mut rx_user) = connect(&hub, "user-1", UserRole::User);
        let (target_conn, mut rx_target) = connect(&hub, "user-2", UserRole::User);
        rx_user.try_recv().ok();
        rx_target.try_recv().ok();
        let _ = target_conn;

        let review_id = Uuid::new_v4();
        dispatch(
            &hub,
            user_conn,
            ClientEvent::ApproveReview {
                review_id,
                user_id: "user-2".to_string(),
            },
        );
        assert_eq!(rx_target.try_recv().unwrap_err(), TryRecvError::Empty);

        dispatch(
            &hub,
            admin_conn,
            ClientEvent::RejectReview {
                review_id,
                user_id: "user-2".to_string(),
                reason: Some("Off topic".to_string()),
            },
        );
        match rx_target.try_recv().unwrap() {
            ServerEvent::ReviewRejected { message, .. } => assert_eq!(message, "Off topic"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn dispatch_after_disconnect_is_a_no_op() {
        let hub = NotificationHub::new();
        let (conn, _rx) = connect(&hub, "user-1", UserRole::User);
        hub.disconnect(conn);

        // Identity is gone; nothing to route and nothing to panic over.
        dispatch(&hub, conn, ClientEvent::UserOnline);
    }
}
