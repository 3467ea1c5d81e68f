// Notification hub - live connections, room membership, and event routing.
//
// Delivery is fire-and-forget: events go to whoever is connected at publish
// time, there is no queue, no redelivery, and a connection that joins later
// never sees past events. The registry is an owned map behind a mutex, so a
// publish always observes a consistent membership snapshot and events for
// the same room reach each member in publish order.

use crate::core::notifications::notification_models::{ReviewSummary, Room, ServerEvent};
use crate::core::reviews::review_models::UserIdentity;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

pub type ConnectionId = Uuid;

#[derive(Debug, Error)]
pub enum HubError {
    /// Identity verification did not yield a valid, active identity.
    #[error("Authentication error: invalid identity")]
    Unauthenticated,
}

struct ConnectionHandle {
    identity: UserIdentity,
    rooms: HashSet<Room>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// Owns every live connection for its lifetime. Membership mutates only on
/// connect/disconnect; publish reads it.
pub struct NotificationHub {
    connections: Mutex<HashMap<ConnectionId, ConnectionHandle>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    // A poisoned registry only means another thread panicked mid-operation;
    // the map itself is still usable, so recover rather than propagate.
    fn registry(&self) -> MutexGuard<'_, HashMap<ConnectionId, ConnectionHandle>> {
        self.connections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a connection, joining `user_<id>` always and `admin`
    /// additionally for admin identities. Admin arrivals are announced
    /// process-wide.
    pub fn connect(
        &self,
        identity: UserIdentity,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> Result<ConnectionId, HubError> {
        if identity.id.trim().is_empty() {
            return Err(HubError::Unauthenticated);
        }

        let id = Uuid::new_v4();
        let mut rooms = HashSet::new();
        rooms.insert(Room::user(identity.id.clone()));
        if identity.is_admin() {
            rooms.insert(Room::Admin);
        }

        let mut registry = self.registry();
        registry.insert(
            id,
            ConnectionHandle {
                identity: identity.clone(),
                rooms,
                sender,
            },
        );

        tracing::info!(
            connection = %id,
            user = %identity.id,
            role = ?identity.role,
            "socket connected"
        );

        if identity.is_admin() {
            Self::deliver_all(
                &registry,
                &ServerEvent::AdminOnline {
                    admin_id: identity.id,
                    admin_name: identity.name,
                    timestamp: Utc::now(),
                },
            );
        }

        Ok(id)
    }

    /// Removes a connection from every room. Admin departures are announced
    /// process-wide to the connections that remain.
    pub fn disconnect(&self, id: ConnectionId) {
        let mut registry = self.registry();
        let Some(handle) = registry.remove(&id) else {
            return;
        };

        tracing::info!(connection = %id, user = %handle.identity.id, "socket disconnected");

        if handle.identity.is_admin() {
            Self::deliver_all(
                &registry,
                &ServerEvent::AdminOffline {
                    admin_id: handle.identity.id,
                    timestamp: Utc::now(),
                },
            );
        }
    }

    /// The identity bound to a live connection, if it is still registered.
    pub fn identity(&self, id: ConnectionId) -> Option<UserIdentity> {
        self.registry().get(&id).map(|h| h.identity.clone())
    }

    pub fn connection_count(&self) -> usize {
        self.registry().len()
    }

    /// Delivers `event` to every current member of `room`. Returns how many
    /// connections it was handed to; zero recipients is not an error.
    pub fn publish(&self, room: &Room, event: ServerEvent) -> usize {
        let registry = self.registry();
        let mut delivered = 0;
        for handle in registry.values() {
            if handle.rooms.contains(room) && handle.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn publish_except(&self, room: &Room, skip: ConnectionId, event: ServerEvent) -> usize {
        let registry = self.registry();
        let mut delivered = 0;
        for (id, handle) in registry.iter() {
            if *id == skip {
                continue;
            }
            if handle.rooms.contains(room) && handle.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Delivers `event` to every connection regardless of rooms.
    pub fn broadcast_all(&self, event: ServerEvent) -> usize {
        let registry = self.registry();
        Self::deliver_all(&registry, &event)
    }

    fn deliver_all(
        registry: &HashMap<ConnectionId, ConnectionHandle>,
        event: &ServerEvent,
    ) -> usize {
        let mut delivered = 0;
        for handle in registry.values() {
            if handle.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Direct send to one connection, used for acks on the echo path.
    pub fn send_to(&self, id: ConnectionId, event: ServerEvent) {
        if let Some(handle) = self.registry().get(&id) {
            let _ = handle.sender.send(event);
        }
    }

    /// Announces a freshly created review to the admin room.
    pub fn broadcast_new_submission(&self, summary: ReviewSummary) {
        let delivered = self.publish(
            &Room::Admin,
            ServerEvent::NewReviewNotification {
                summary,
                timestamp: Utc::now(),
            },
        );
        tracing::debug!(delivered, "new submission broadcast to admin room");
    }

    /// Pushes a decision event to the submitter's private channel.
    pub fn notify_decision(&self, user_id: &str, event: ServerEvent) {
        let delivered = self.publish(&Room::user(user_id), event);
        tracing::debug!(user = user_id, delivered, "decision notification published");
    }

    /// Relays a typing indicator to the other admins. Only accepted from
    /// admin connections; anyone else is ignored without an error, since
    /// this is a low-stakes UX signal.
    pub fn relay_typing(&self, sender_id: ConnectionId, review_id: &str, is_typing: bool) {
        let Some(sender) = self.identity(sender_id) else {
            return;
        };
        if !sender.is_admin() {
            return;
        }

        self.publish_except(
            &Room::Admin,
            sender_id,
            ServerEvent::AdminTyping {
                admin_id: sender.id,
                admin_name: sender.name,
                review_id: review_id.to_string(),
                is_typing,
                timestamp: Utc::now(),
            },
        );
    }

    /// Handles the `userOnline` client event: admins re-announce presence,
    /// everyone else is a no-op.
    pub fn mark_online(&self, id: ConnectionId) {
        let Some(identity) = self.identity(id) else {
            return;
        };
        if !identity.is_admin() {
            return;
        }

        self.broadcast_all(ServerEvent::AdminOnline {
            admin_id: identity.id,
            admin_name: identity.name,
            timestamp: Utc::now(),
        });
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
