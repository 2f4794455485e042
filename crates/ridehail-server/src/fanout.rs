//! Notification fan-out.
//!
//! Pure delivery: takes coordinator-produced notifications, resolves each
//! target selector against the connection registry, and pushes the
//! serialized message onto the matching sessions' channels. No queuing, no
//! retry - a recipient with no live session is dropped, and a reconnecting
//! client re-syncs from ride state.

use ridehail_proto::{Notification, ServerMessage, Target};

use crate::registry::ConnectionRegistry;

/// Delivers notifications to registry-resolved targets.
#[derive(Clone, Debug)]
pub struct Notifier {
    registry: ConnectionRegistry,
}

impl Notifier {
    /// Build a notifier over the process's connection registry.
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Deliver one notification. Fire-and-forget; never blocks.
    pub fn deliver(&self, notification: &Notification) {
        let message = ServerMessage::Event(notification.event.clone());
        let text = match message.encode() {
            Ok(text) => text,
            Err(err) => {
                // Events are plain data; failure here means a bug, not bad input.
                tracing::error!(topic = notification.event.topic(), %err, "event encoding failed");
                return;
            }
        };

        let delivered = match notification.target {
            Target::Group(group) => self.registry.group_send(group, &text),
            Target::Principal(principal_id) => self.registry.direct_send(principal_id, &text),
        };

        tracing::debug!(
            topic = notification.event.topic(),
            target = ?notification.target,
            delivered,
            "event fan-out"
        );
    }

    /// Deliver a batch in order.
    pub fn deliver_all(&self, notifications: &[Notification]) {
        for notification in notifications {
            self.deliver(notification);
        }
    }
}
