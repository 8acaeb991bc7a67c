//! Event types for inter-service communication.
//!
//! Events flow through an event bus allowing services to react to state
//! changes elsewhere in the system. Observers do not consume these for
//! correctness; the authoritative view always comes from re-reading the
//! store.

use crate::{Order, OrderStatus, Role};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all storefront events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StorefrontEvent {
	/// Events from the order lifecycle.
	Order(OrderEvent),
	/// Events from the identity provider.
	Auth(AuthEvent),
}

/// Events related to the order lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A checkout completed and the compound order was persisted.
	Placed { order: Order },
	/// A vendor advanced one sub-order's status.
	StatusChanged {
		order_id: String,
		vendor_id: String,
		from: OrderStatus,
		to: OrderStatus,
	},
}

/// Events related to identity and account state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuthEvent {
	/// A new account was created.
	SignedUp { uid: String, role: Role },
	/// A user signed in.
	SignedIn { uid: String },
	/// A user signed out.
	SignedOut { uid: String },
	/// An admin approved or revoked a vendor account.
	VendorVerificationChanged { uid: String, verified: bool },
}
