//! Event bus for inter-service communication.
//!
//! A thin wrapper over a broadcast channel. Events are diagnostic and
//! reactive, never authoritative: observers always re-read the store for
//! the current state, so a dropped event cannot corrupt anything.

use storefront_types::StorefrontEvent;
use tokio::sync::broadcast;

/// Default capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast bus carrying [`StorefrontEvent`]s between services.
#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<StorefrontEvent>,
}

impl EventBus {
	/// Creates a new event bus with the given channel capacity.
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	/// Publishes an event to all current subscribers.
	///
	/// Having no subscribers is not an error.
	pub fn publish(&self, event: StorefrontEvent) {
		let _ = self.sender.send(event);
	}

	/// Subscribes to events published after this call.
	pub fn subscribe(&self) -> broadcast::Receiver<StorefrontEvent> {
		self.sender.subscribe()
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new(EVENT_CHANNEL_CAPACITY)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use storefront_types::{AuthEvent, Role};

	#[tokio::test]
	async fn events_reach_subscribers() {
		let bus = EventBus::default();
		let mut rx = bus.subscribe();
		bus.publish(StorefrontEvent::Auth(AuthEvent::SignedUp {
			uid: "u1".into(),
			role: Role::Customer,
		}));
		let event = rx.recv().await.unwrap();
		assert!(matches!(
			event,
			StorefrontEvent::Auth(AuthEvent::SignedUp { uid, .. }) if uid == "u1"
		));
	}

	#[test]
	fn publishing_without_subscribers_is_fine() {
		let bus = EventBus::default();
		bus.publish(StorefrontEvent::Auth(AuthEvent::SignedOut {
			uid: "u1".into(),
		}));
	}
}
